/// Events emitted while a workflow runs.
#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Runs `step` between a `PhaseStart` and `PhaseFinish` pair. The finish event is only
    /// sent when the step succeeds.
    pub fn phase<T, E>(
        &self,
        name: &'static str,
        step: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        self.report(Progress::PhaseStart { name });
        let result = step()?;
        self.report(Progress::PhaseFinish);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording_reporter() -> (ProgressReporter<'static>, Arc<Mutex<Vec<String>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |p| {
            sink.lock().unwrap().push(format!("{p:?}"));
        }));
        (reporter, events)
    }

    #[test]
    fn reporter_without_callback_is_silent() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::Message("ignored".to_string()));
    }

    #[test]
    fn phase_wraps_successful_step() {
        let (reporter, events) = recording_reporter();
        let value: Result<u32, ()> = reporter.phase("Work", || Ok(7));

        assert_eq!(value, Ok(7));
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].contains("Work"));
        assert_eq!(events[1], "PhaseFinish");
    }

    #[test]
    fn phase_skips_finish_on_error() {
        let (reporter, events) = recording_reporter();
        let value: Result<(), &str> = reporter.phase("Work", || Err("boom"));

        assert_eq!(value, Err("boom"));
        assert_eq!(events.lock().unwrap().len(), 1);
    }
}
