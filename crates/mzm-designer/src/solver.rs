//! Bridges [`mzm_core::multi_solver::SolutionCollector`] and
//! [`mzm_core::improver::ImprovementCollector`] callbacks — which fire on
//! worker threads — back to the render loop, in the same receiver-draining
//! style as the teacher's `tui/app.rs` background-search channel.

use std::sync::mpsc::Sender;

use mzm_core::improver::ImprovementCollector;
use mzm_core::level_data::LevelData;
use mzm_core::multi_solver::{SolutionCategory, SolutionCollector};
use mzm_core::types::Path;

pub enum SolverEvent {
    Solution { generation: u64, category: SolutionCategory, path: Option<Path> },
    Rating { generation: u64, rating: f64 },
    Improvement { rating: f64, push_count: usize, level: LevelData },
}

pub struct AppSolutionCollector {
    pub tx: Sender<SolverEvent>,
}

impl SolutionCollector for AppSolutionCollector {
    fn collect_solution(&self, level_number: u64, category: SolutionCategory, path: Option<Path>) {
        let _ = self.tx.send(SolverEvent::Solution { generation: level_number, category, path });
    }

    fn collect_rating(&self, level_number: u64, rating: f64, _push_count: Option<usize>) {
        let _ = self.tx.send(SolverEvent::Rating { generation: level_number, rating });
    }
}

pub struct AppImprovementCollector {
    pub tx: Sender<SolverEvent>,
}

impl ImprovementCollector for AppImprovementCollector {
    fn collect_improvement(&self, rating: f64, push_count: usize, _path: Path, level: LevelData) {
        let _ = self.tx.send(SolverEvent::Improvement { rating, push_count, level });
    }
}
