//! Ordered strategy lists.
//!
//! PDF text followed by OCR, the `.msg` tiers, and attachment conversion all
//! share one shape: try strategies in order until one yields usable output.
//! [`FallbackChain`] is that shape, parameterized by input and output type.

use crate::PostfachError;
use crate::Result;

/// One way of turning `I` into `O`.
pub trait Strategy<I: ?Sized, O>: Send + Sync {
    /// Name recorded in diagnostics.
    fn name(&self) -> &'static str;

    /// Cheap precondition. A strategy that does not apply is skipped without running.
    fn applies(&self, _input: &I) -> bool {
        true
    }

    /// `Ok(None)` means "ran, found nothing usable"; the chain moves on.
    fn attempt(&self, input: &I) -> Result<Option<O>>;
}

/// What happened during one [`FallbackChain::run`].
#[derive(Debug)]
pub struct ChainRun<O> {
    pub output: Option<O>,
    /// Strategy that produced `output`.
    pub winner: Option<&'static str>,
    /// Strategies that ran, in order.
    pub attempted: Vec<&'static str>,
    /// Strategies whose precondition failed.
    pub skipped: Vec<&'static str>,
    pub errors: Vec<(&'static str, PostfachError)>,
}

impl<O> ChainRun<O> {
    /// Last error raised by a strategy, if any.
    pub fn into_last_error(self) -> Option<PostfachError> {
        self.errors.into_iter().last().map(|(_, err)| err)
    }
}

/// Strategies may borrow from the caller for `'a`.
pub struct FallbackChain<'a, I: ?Sized, O> {
    strategies: Vec<Box<dyn Strategy<I, O> + 'a>>,
}

impl<'a, I: ?Sized, O> Default for FallbackChain<'a, I, O> {
    fn default() -> Self {
        Self { strategies: Vec::new() }
    }
}

impl<'a, I: ?Sized, O> FallbackChain<'a, I, O> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, strategy: impl Strategy<I, O> + 'a) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn push(&mut self, strategy: Box<dyn Strategy<I, O> + 'a>) {
        self.strategies.push(strategy);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Try each strategy in order and stop at the first one that yields output.
    ///
    /// Strategy errors are collected, never propagated; I/O errors are the
    /// exception and abort the run since they indicate a system problem.
    pub fn run(&self, input: &I) -> Result<ChainRun<O>> {
        let mut run = ChainRun {
            output: None,
            winner: None,
            attempted: Vec::new(),
            skipped: Vec::new(),
            errors: Vec::new(),
        };

        for strategy in &self.strategies {
            let name = strategy.name();
            if !strategy.applies(input) {
                tracing::debug!(strategy = name, "Strategy precondition not met, skipping");
                run.skipped.push(name);
                continue;
            }

            run.attempted.push(name);
            match strategy.attempt(input) {
                Ok(Some(output)) => {
                    tracing::debug!(strategy = name, "Strategy produced output");
                    run.output = Some(output);
                    run.winner = Some(name);
                    return Ok(run);
                }
                Ok(None) => {
                    tracing::debug!(strategy = name, "Strategy produced nothing, falling through");
                }
                Err(PostfachError::Io(e)) => return Err(PostfachError::Io(e)),
                Err(e) => {
                    tracing::warn!(strategy = name, error = %e, "Strategy failed, falling through");
                    run.errors.push((name, e));
                }
            }
        }

        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        name: &'static str,
        output: Option<&'static str>,
    }

    impl Strategy<str, String> for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn attempt(&self, _input: &str) -> Result<Option<String>> {
            Ok(self.output.map(str::to_string))
        }
    }

    struct Failing;

    impl Strategy<str, String> for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn attempt(&self, _input: &str) -> Result<Option<String>> {
            Err(PostfachError::parsing("corrupt"))
        }
    }

    struct OnlyForLongInput;

    impl Strategy<str, String> for OnlyForLongInput {
        fn name(&self) -> &'static str {
            "long_only"
        }

        fn applies(&self, input: &str) -> bool {
            input.len() > 10
        }

        fn attempt(&self, input: &str) -> Result<Option<String>> {
            Ok(Some(input.to_uppercase()))
        }
    }

    #[test]
    fn test_first_output_wins() {
        let chain = FallbackChain::new()
            .with(Fixed { name: "a", output: None })
            .with(Fixed { name: "b", output: Some("from b") })
            .with(Fixed { name: "c", output: Some("from c") });

        let run = chain.run("input").unwrap();
        assert_eq!(run.output.as_deref(), Some("from b"));
        assert_eq!(run.winner, Some("b"));
        assert_eq!(run.attempted, vec!["a", "b"]);
    }

    #[test]
    fn test_errors_fall_through() {
        let chain = FallbackChain::new()
            .with(Failing)
            .with(Fixed { name: "raw", output: Some("ok") });

        let run = chain.run("input").unwrap();
        assert_eq!(run.winner, Some("raw"));
        assert_eq!(run.errors.len(), 1);
        assert_eq!(run.errors[0].0, "failing");
    }

    #[test]
    fn test_precondition_skips_without_running() {
        let chain = FallbackChain::new()
            .with(OnlyForLongInput)
            .with(Fixed { name: "raw", output: Some("raw") });

        let run = chain.run("short").unwrap();
        assert_eq!(run.skipped, vec!["long_only"]);
        assert_eq!(run.attempted, vec!["raw"]);
    }

    #[test]
    fn test_exhausted_chain_reports_last_error() {
        let chain = FallbackChain::new()
            .with(Fixed { name: "a", output: None })
            .with(Failing);

        let run = chain.run("input").unwrap();
        assert!(run.output.is_none());
        assert_eq!(chain.names(), vec!["a", "failing"]);
        assert!(matches!(run.into_last_error(), Some(PostfachError::Parsing { .. })));
    }

    #[test]
    fn test_io_errors_abort() {
        struct Broken;
        impl Strategy<str, String> for Broken {
            fn name(&self) -> &'static str {
                "broken"
            }
            fn attempt(&self, _input: &str) -> Result<Option<String>> {
                Err(std::io::Error::other("disk gone").into())
            }
        }

        let chain = FallbackChain::new()
            .with(Broken)
            .with(Fixed { name: "raw", output: Some("ok") });
        assert!(matches!(chain.run("input"), Err(PostfachError::Io(_))));
    }
}
