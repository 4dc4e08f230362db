/// Time in milliseconds, relative to the activation edge
pub type TimeMs = i64;

/// Identifier of a scripted actor (chat speaker or panel)
pub type ActorId = String;

/// Identifier of an agent node in the orchestration diagram
pub type AgentId = String;
