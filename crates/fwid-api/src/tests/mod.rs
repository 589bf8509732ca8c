//! Behavioural suites for the agent IPC surface.
