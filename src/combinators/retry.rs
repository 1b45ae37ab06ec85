use std::sync::Arc;

use crate::context::Context;
use crate::error::TaskError;
use crate::policies::RetryPolicy;
use crate::tasks::{BoxTaskFuture, Task, TaskRef};

/// Repeats failed calls of `task` while `policy` agrees.
///
/// Every attempt sees its zero-based index through [`Context::attempt`].
/// [`TaskError::Stopped`] is returned right away, without asking the policy.
/// The result of the last attempt is returned.
///
/// # Example
/// ```rust
/// use tickvisor::combinators::retry;
/// use tickvisor::policies::SimpleRetry;
/// use tickvisor::{TaskError, adapt};
///
/// let flaky = retry(SimpleRetry::new(3), adapt::fallible(|| async {
///     Err(TaskError::fail("connection refused"))
/// }));
/// # let _ = flaky;
/// ```
pub fn retry(policy: impl RetryPolicy, task: TaskRef) -> TaskRef {
    Arc::new(Retry {
        policy: Arc::new(policy),
        task,
    })
}

struct Retry {
    policy: Arc<dyn RetryPolicy>,
    task: TaskRef,
}

impl Task for Retry {
    fn spawn(&self, ctx: Context) -> BoxTaskFuture {
        let policy = Arc::clone(&self.policy);
        let task = Arc::clone(&self.task);
        Box::pin(async move {
            let mut attempt = 0u32;
            loop {
                let attempt_ctx = ctx.clone().with_attempt(attempt);
                let res = task.spawn(attempt_ctx.clone()).await;
                if matches!(res, Err(TaskError::Stopped))
                    || !policy
                        .should_retry(&attempt_ctx, attempt, res.as_ref().err())
                        .await
                {
                    return res;
                }
                attempt = attempt.saturating_add(1);
            }
        })
    }
}
