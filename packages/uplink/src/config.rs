//! Startup configuration record for the node.
//!
//! Everything the node needs (credentials, collector endpoint, device id and
//! timing) is carried in [`NodeConfig`] and handed to the components at boot.
//! Values arriving from the outside go through `sanitized()` clamps before use.

use heapless::String;

use crate::connectivity::RetryPolicy;

pub const SSID_MAX: usize = 32;
pub const PASSPHRASE_MAX: usize = 64;
pub const ENDPOINT_MAX: usize = 128;
pub const DEVICE_ID_MAX: usize = 32;

pub const UPLINK_PERIOD_DEFAULT_MS: u32 = 15_000;
pub const UPLINK_PERIOD_MIN_MS: u32 = 1_000;
pub const UPLINK_PERIOD_MAX_MS: u32 = 3_600_000;
pub const UPLINK_TIMEOUT_DEFAULT_MS: u32 = 8_000;
pub const UPLINK_TIMEOUT_MIN_MS: u32 = 500;
pub const UPLINK_TIMEOUT_MAX_MS: u32 = 60_000;
pub const RESPONSE_PREFIX_DEFAULT: u16 = 128;
pub const RESPONSE_PREFIX_MAX: usize = 512;

const HTTP_DEFAULT_PORT: u16 = 80;
const HTTPS_DEFAULT_PORT: u16 = 443;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    SsidLength,
    PassphraseLength,
    EndpointLength,
    EndpointScheme,
    EndpointHost,
    EndpointPort,
    DeviceId,
    TlsUnverified,
}

impl ConfigError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SsidLength => "ssid_length",
            Self::PassphraseLength => "passphrase_length",
            Self::EndpointLength => "endpoint_length",
            Self::EndpointScheme => "endpoint_scheme",
            Self::EndpointHost => "endpoint_host",
            Self::EndpointPort => "endpoint_port",
            Self::DeviceId => "device_id",
            Self::TlsUnverified => "tls_unverified",
        }
    }
}

/// Weakest access point security the station accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SecurityPolicy {
    Open,
    Wpa,
    #[default]
    Wpa2Personal,
    WpaWpa2Personal,
    Wpa2Wpa3Personal,
    Wpa3Personal,
}

impl SecurityPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Wpa => "wpa",
            Self::Wpa2Personal => "wpa2_personal",
            Self::WpaWpa2Personal => "wpa_wpa2_personal",
            Self::Wpa2Wpa3Personal => "wpa2_wpa3_personal",
            Self::Wpa3Personal => "wpa3_personal",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkCredentials {
    ssid: String<SSID_MAX>,
    passphrase: String<PASSPHRASE_MAX>,
    min_security: SecurityPolicy,
}

impl NetworkCredentials {
    /// An empty passphrase always means an open network, whatever policy was asked for.
    pub fn new(
        ssid: &str,
        passphrase: &str,
        min_security: SecurityPolicy,
    ) -> Result<Self, ConfigError> {
        if ssid.is_empty() {
            return Err(ConfigError::SsidLength);
        }
        let ssid = String::try_from(ssid).map_err(|_| ConfigError::SsidLength)?;
        let passphrase =
            String::try_from(passphrase).map_err(|_| ConfigError::PassphraseLength)?;
        let min_security = if passphrase.is_empty() {
            SecurityPolicy::Open
        } else {
            min_security
        };
        Ok(Self {
            ssid,
            passphrase,
            min_security,
        })
    }

    pub fn ssid(&self) -> &str {
        self.ssid.as_str()
    }

    pub fn passphrase(&self) -> &str {
        self.passphrase.as_str()
    }

    pub fn min_security(&self) -> SecurityPolicy {
        self.min_security
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportSecurity {
    Plain,
    Tls,
}

impl TransportSecurity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Tls => "tls",
        }
    }
}

/// Trust placed in an `https://` collector.
///
/// The uplink TLS stack negotiates encryption but cannot validate the server
/// certificate chain, so an `https://` endpoint is refused unless the build
/// opts into [`TlsTrust::EncryptOnly`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TlsTrust {
    #[default]
    Refuse,
    EncryptOnly,
}

impl TlsTrust {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Refuse => "refuse",
            Self::EncryptOnly => "encrypt_only",
        }
    }
}

/// Absolute collector URL, split once at parse time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    url: String<ENDPOINT_MAX>,
    security: TransportSecurity,
    host_start: usize,
    host_end: usize,
    port: u16,
}

impl Endpoint {
    pub fn parse(url: &str, tls: TlsTrust) -> Result<Self, ConfigError> {
        let (security, rest_start, default_port) = if url.starts_with("https://") {
            if tls == TlsTrust::Refuse {
                return Err(ConfigError::TlsUnverified);
            }
            (TransportSecurity::Tls, "https://".len(), HTTPS_DEFAULT_PORT)
        } else if url.starts_with("http://") {
            (TransportSecurity::Plain, "http://".len(), HTTP_DEFAULT_PORT)
        } else {
            return Err(ConfigError::EndpointScheme);
        };

        let rest = &url[rest_start..];
        let authority_len = rest.find(['/', '?']).unwrap_or(rest.len());
        let authority = &rest[..authority_len];

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| ConfigError::EndpointPort)?;
                if port == 0 {
                    return Err(ConfigError::EndpointPort);
                }
                (host, port)
            }
            None => (authority, default_port),
        };
        if host.is_empty() || host.contains(['@', '[', ']', ' ']) {
            return Err(ConfigError::EndpointHost);
        }

        let url = String::try_from(url).map_err(|_| ConfigError::EndpointLength)?;
        Ok(Self {
            url,
            security,
            host_start: rest_start,
            host_end: rest_start + host.len(),
            port,
        })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn security(&self) -> TransportSecurity {
        self.security
    }

    pub fn host(&self) -> &str {
        &self.url[self.host_start..self.host_end]
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UplinkPolicy {
    pub period_ms: u32,
    pub timeout_ms: u32,
    pub response_prefix_len: u16,
    pub accept_json: bool,
}

impl UplinkPolicy {
    pub const fn defaults() -> Self {
        Self {
            period_ms: UPLINK_PERIOD_DEFAULT_MS,
            timeout_ms: UPLINK_TIMEOUT_DEFAULT_MS,
            response_prefix_len: RESPONSE_PREFIX_DEFAULT,
            accept_json: true,
        }
    }

    pub const fn sanitized(self) -> Self {
        let response_prefix_len = if self.response_prefix_len as usize > RESPONSE_PREFIX_MAX {
            RESPONSE_PREFIX_MAX as u16
        } else {
            self.response_prefix_len
        };
        Self {
            period_ms: clamp_u32(self.period_ms, UPLINK_PERIOD_MIN_MS, UPLINK_PERIOD_MAX_MS),
            timeout_ms: clamp_u32(self.timeout_ms, UPLINK_TIMEOUT_MIN_MS, UPLINK_TIMEOUT_MAX_MS),
            response_prefix_len,
            accept_json: self.accept_json,
        }
    }
}

impl Default for UplinkPolicy {
    fn default() -> Self {
        Self::defaults()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeConfig {
    pub credentials: NetworkCredentials,
    pub endpoint: Endpoint,
    pub device_id: String<DEVICE_ID_MAX>,
    pub uplink: UplinkPolicy,
    pub retry: RetryPolicy,
}

impl NodeConfig {
    pub fn new(
        credentials: NetworkCredentials,
        endpoint: Endpoint,
        device_id: &str,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            credentials,
            endpoint,
            device_id: parse_device_id(device_id)?,
            uplink: UplinkPolicy::defaults(),
            retry: RetryPolicy::Immediate,
        })
    }

    pub fn with_uplink(mut self, uplink: UplinkPolicy) -> Self {
        self.uplink = uplink.sanitized();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry.sanitized();
        self
    }
}

// Printable ASCII without quotes or backslashes.
fn parse_device_id(device_id: &str) -> Result<String<DEVICE_ID_MAX>, ConfigError> {
    let valid = !device_id.is_empty()
        && device_id
            .bytes()
            .all(|b| b.is_ascii_graphic() && b != b'"' && b != b'\\');
    if !valid {
        return Err(ConfigError::DeviceId);
    }
    String::try_from(device_id).map_err(|_| ConfigError::DeviceId)
}

pub(crate) const fn clamp_u32(value: u32, min: u32, max: u32) -> u32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
