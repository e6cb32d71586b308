use log::LevelFilter;
use tauri_plugin_log::{Target, TargetKind, TimezoneStrategy};

/// Log file name inside the app log directory
pub const LOG_FILE_NAME: &str = "clipboard-shelf";

pub fn default_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Logger plugin: stdout plus a file in the app log directory
pub fn get_builder() -> tauri_plugin_log::Builder {
    tauri_plugin_log::Builder::new()
        .clear_targets()
        .timezone_strategy(TimezoneStrategy::UseLocal)
        .level(default_level())
        // Plugin internals are noisy at debug level
        .level_for("tao", LevelFilter::Info)
        .level_for("wry", LevelFilter::Info)
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .target(Target::new(TargetKind::Stdout))
        .target(Target::new(TargetKind::LogDir {
            file_name: Some(LOG_FILE_NAME.to_string()),
        }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_constructs() {
        let _builder = get_builder();
    }

    #[test]
    fn debug_builds_log_debug() {
        assert_eq!(default_level() == LevelFilter::Debug, cfg!(debug_assertions));
    }
}
