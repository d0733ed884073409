#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Associating,
    Ready,
}

impl LinkState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Associating => "Associating",
            Self::Ready => "Ready",
        }
    }
}

/// Events raised by the network stack, plus the manager's own start request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    Initialize,
    StationStarted,
    AddressAssigned { ipv4: [u8; 4] },
    Disconnected { reason: u8 },
}

impl LinkEvent {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::StationStarted => "sta_start",
            Self::AddressAssigned { .. } => "got_ip",
            Self::Disconnected { .. } => "sta_disconnected",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkCounters {
    pub association_attempts: u32,
    pub association_errors: u32,
    pub disconnections: u32,
    pub addresses_assigned: u32,
}
