//! Provide Speech Output.
//!
pub mod speaker;
pub mod throttle;

use crate::module::util::conf::Config;

use self::speaker::{CommandNarrator, Narrator, SilentNarrator};
use self::throttle::{MonotonicClock, NarrationThrottle};

/// Build the throttled narrator described by the `[narration]` section.
///
pub fn build_narration(conf: &Config) -> NarrationThrottle {
    let narrator: Box<dyn Narrator> = if conf.narration.enabled {
        Box::new(CommandNarrator::new(
            &conf.narration.command,
            &conf.narration.args,
        ))
    } else {
        Box::new(SilentNarrator)
    };
    NarrationThrottle::new(
        conf.narration.cooldown_ms,
        narrator,
        Box::new(MonotonicClock::new()),
    )
}
