//! The branch-divergence recovery policy consulted by `Start`.

/// What to do when a ticket's branch exists and has diverged (is both ahead
/// of and behind) the default branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivergencePolicy {
    /// Reset the branch to the default branch's current tip.
    Recreate,
    /// Keep the branch as-is and proceed.
    UseAsIs,
    /// Refuse to start; no side effects.
    Abort,
}

/// A caller of the lifecycle engine, not the engine itself, decides the
/// policy for a given invocation — interactively (prompting on a TTY) or
/// non-interactively. The engine's own default, used whenever no caller
/// override is supplied, is always [`DivergencePolicy::Recreate`]: `Start`
/// never blocks waiting on a prompt when stdin isn't a TTY.
pub fn non_interactive_default() -> DivergencePolicy {
    DivergencePolicy::Recreate
}
