//! Convenience re-exports for frequently used types & plugins.
pub use crate::launch::{LaunchError, LaunchOptions};
pub use crate::plugins::core_sim::{CoreSimPlugin, GolfSet, SimState};
pub use crate::plugins::events::*;
pub use crate::plugins::game_state::{GolfMatch, MatchError, MatchPhase, Player, PlayerId, Standing};
pub use crate::plugins::course::{CourseDef, CourseError, CoursePlugin, RulesDef};
pub use crate::plugins::course_builder::{BlockGrid, BlockKind, CourseBuilderPlugin, CourseLayout};
pub use crate::plugins::ball::{BallPlugin, BallTuning, GolfBall};
pub use crate::plugins::shooting::{ShootingPlugin, ShotConfig, ShotMode, ShotState};
pub use crate::plugins::game_flow::GameFlowPlugin;
pub use crate::plugins::ui_messages::{UiHistory, UiMessage, UiMessageEvent, UiMessagesPlugin, UiTarget};
pub use crate::plugins::autoplay::{AutoplayPlugin, Bot, BotConfig};
