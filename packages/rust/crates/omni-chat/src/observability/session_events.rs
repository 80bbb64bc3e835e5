/// Stable event identifiers attached to structured log records (`event = ...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SessionCreated,
    SessionCreateRetried,
    SessionCreateFailed,
    SessionInserted,
    SessionRemoved,
    SessionsCleared,
    SessionsListed,
    SessionLookupMissed,
    TurnStarted,
    TurnGreeting,
    TurnCompleted,
    TurnFailed,
    AgentBindingBuilt,
    AgentToolUnavailable,
    AgentToolRoundStarted,
    AgentToolInvoked,
    AgentToolFailed,
    AgentToolRoundsExhausted,
    AgentProviderCallFailed,
    PersistenceRecordCreated,
    PersistenceRecordUpdated,
    PersistenceRecordMissing,
    PersistenceSyncFailed,
    PersistenceDrainTimedOut,
    PersistenceValkeyConnected,
    PersistenceValkeyCommandRetrySucceeded,
    PersistenceValkeyCommandRetryFailed,
    GatewayStarted,
    GatewayStopped,
    GatewayCredentialMissing,
}

impl SessionEvent {
    pub const ALL: [Self; 30] = [
        Self::SessionCreated,
        Self::SessionCreateRetried,
        Self::SessionCreateFailed,
        Self::SessionInserted,
        Self::SessionRemoved,
        Self::SessionsCleared,
        Self::SessionsListed,
        Self::SessionLookupMissed,
        Self::TurnStarted,
        Self::TurnGreeting,
        Self::TurnCompleted,
        Self::TurnFailed,
        Self::AgentBindingBuilt,
        Self::AgentToolUnavailable,
        Self::AgentToolRoundStarted,
        Self::AgentToolInvoked,
        Self::AgentToolFailed,
        Self::AgentToolRoundsExhausted,
        Self::AgentProviderCallFailed,
        Self::PersistenceRecordCreated,
        Self::PersistenceRecordUpdated,
        Self::PersistenceRecordMissing,
        Self::PersistenceSyncFailed,
        Self::PersistenceDrainTimedOut,
        Self::PersistenceValkeyConnected,
        Self::PersistenceValkeyCommandRetrySucceeded,
        Self::PersistenceValkeyCommandRetryFailed,
        Self::GatewayStarted,
        Self::GatewayStopped,
        Self::GatewayCredentialMissing,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SessionCreated => "session.created",
            Self::SessionCreateRetried => "session.create.retried",
            Self::SessionCreateFailed => "session.create.failed",
            Self::SessionInserted => "session.inserted",
            Self::SessionRemoved => "session.removed",
            Self::SessionsCleared => "session.cleared_all",
            Self::SessionsListed => "session.listed",
            Self::SessionLookupMissed => "session.lookup.missed",
            Self::TurnStarted => "session.turn.started",
            Self::TurnGreeting => "session.turn.greeting",
            Self::TurnCompleted => "session.turn.completed",
            Self::TurnFailed => "session.turn.failed",
            Self::AgentBindingBuilt => "agent.binding.built",
            Self::AgentToolUnavailable => "agent.tool.unavailable",
            Self::AgentToolRoundStarted => "agent.tool.round_started",
            Self::AgentToolInvoked => "agent.tool.invoked",
            Self::AgentToolFailed => "agent.tool.failed",
            Self::AgentToolRoundsExhausted => "agent.tool.rounds_exhausted",
            Self::AgentProviderCallFailed => "agent.provider.call_failed",
            Self::PersistenceRecordCreated => "persistence.record_created",
            Self::PersistenceRecordUpdated => "persistence.record_updated",
            Self::PersistenceRecordMissing => "persistence.record_missing",
            Self::PersistenceSyncFailed => "persistence.sync_failed",
            Self::PersistenceDrainTimedOut => "persistence.drain_timed_out",
            Self::PersistenceValkeyConnected => "persistence.valkey.connected",
            Self::PersistenceValkeyCommandRetrySucceeded => {
                "persistence.valkey.command_retry_succeeded"
            }
            Self::PersistenceValkeyCommandRetryFailed => "persistence.valkey.command_retry_failed",
            Self::GatewayStarted => "gateway.started",
            Self::GatewayStopped => "gateway.stopped",
            Self::GatewayCredentialMissing => "gateway.credential_missing",
        }
    }
}
