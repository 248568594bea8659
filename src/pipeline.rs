//! Ordered frame transformations
//!
//! Each importer is written as a list of named stages. A stage takes the
//! frame by value and returns the next one, so stages can be tested on
//! their own and the order they run in is visible in one place.

use crate::error::StatResult;
use crate::types::Frame;
use tracing::debug;

type StageFn<'a> = Box<dyn Fn(Frame) -> StatResult<Frame> + 'a>;

struct Stage<'a> {
    name: &'static str,
    run: StageFn<'a>,
}

/// A named sequence of frame transformations
pub struct Pipeline<'a> {
    name: &'static str,
    stages: Vec<Stage<'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            stages: Vec::new(),
        }
    }

    /// Append a fallible stage
    pub fn stage<F>(mut self, name: &'static str, run: F) -> Self
    where
        F: Fn(Frame) -> StatResult<Frame> + 'a,
    {
        self.stages.push(Stage {
            name,
            run: Box::new(run),
        });
        self
    }

    /// Append a stage that cannot fail
    pub fn map<F>(self, name: &'static str, run: F) -> Self
    where
        F: Fn(Frame) -> Frame + 'a,
    {
        self.stage(name, move |frame| Ok(run(frame)))
    }

    /// Append a stage only when `enabled` is true
    pub fn map_if<F>(self, enabled: bool, name: &'static str, run: F) -> Self
    where
        F: Fn(Frame) -> Frame + 'a,
    {
        if enabled {
            self.map(name, run)
        } else {
            self
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name).collect()
    }

    /// Run every stage in order, stopping at the first error
    pub fn run(&self, input: Frame) -> StatResult<Frame> {
        self.stages.iter().try_fold(input, |frame, stage| {
            let out = (stage.run)(frame)?;
            debug!(
                pipeline = self.name,
                stage = stage.name,
                rows = out.height(),
                columns = out.width(),
                "stage complete"
            );
            Ok(out)
        })
    }
}
