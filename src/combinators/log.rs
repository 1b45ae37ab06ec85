use std::sync::Arc;

use crate::context::Context;
use crate::error::TaskError;
use crate::sinks::LogSink;
use crate::tasks::{BoxTaskFuture, Task, TaskRef};

/// Writes a record to `sink` around every call of `task`.
///
/// Before the call: `Calling {name}`, or `Retry {n} of {name}` under
/// [`retry`](crate::combinators::retry). After the call, at most one error
/// record:
///
/// ```text
/// context deadline passed        Execution deadline exceeded for {name}
/// context cancelled              Execution cancelled for {name}
/// returned Stopped               Execution of {name} stopped ... with error: {err}
/// returned any other error       Execution of {name} failed ... with error: {err}
/// ```
///
/// where `...` is `after retry {n}`, `after the first attempt`, or nothing
/// when the call does not run under `retry`. A call returning `Canceled` or
/// `DeadlineExceeded` is reported like the matching context state.
///
/// An empty `name` falls back to [`Context::task_name`].
pub fn log(sink: Arc<dyn LogSink>, name: impl Into<Arc<str>>, task: TaskRef) -> TaskRef {
    Arc::new(Log {
        sink,
        name: name.into(),
        task,
    })
}

struct Log {
    sink: Arc<dyn LogSink>,
    name: Arc<str>,
    task: TaskRef,
}

impl Task for Log {
    fn spawn(&self, ctx: Context) -> BoxTaskFuture {
        let name: Arc<str> = match (self.name.is_empty(), ctx.task_name()) {
            (true, Some(task_name)) => Arc::from(task_name),
            _ => Arc::clone(&self.name),
        };
        let sink = Arc::clone(&self.sink);
        let attempt = ctx.attempt();

        match attempt {
            Some(n) if n > 0 => sink.info(format_args!("Retry {n} of {name}")),
            _ => sink.info(format_args!("Calling {name}")),
        }

        let fut = self.task.spawn(ctx.clone());
        Box::pin(async move {
            let res = fut.await;
            report(&*sink, &name, attempt, &ctx, &res);
            res
        })
    }
}

fn report(
    sink: &dyn LogSink,
    name: &str,
    attempt: Option<u32>,
    ctx: &Context,
    res: &Result<(), TaskError>,
) {
    match (ctx.err(), res) {
        (Some(TaskError::DeadlineExceeded), _) | (None, Err(TaskError::DeadlineExceeded)) => {
            sink.error(format_args!("Execution deadline exceeded for {name}"))
        }
        (Some(_), _) | (None, Err(TaskError::Canceled)) => {
            sink.error(format_args!("Execution cancelled for {name}"))
        }
        (None, Err(err)) => {
            let verb = match err {
                TaskError::Stopped => "stopped",
                _ => "failed",
            };
            match attempt {
                Some(n) if n > 0 => sink.error(format_args!(
                    "Execution of {name} {verb} after retry {n} with error: {err}"
                )),
                Some(_) => sink.error(format_args!(
                    "Execution of {name} {verb} after the first attempt with error: {err}"
                )),
                None => sink.error(format_args!("Execution of {name} {verb} with error: {err}")),
            }
        }
        (None, Ok(())) => {}
    }
}
