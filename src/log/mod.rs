#![allow(unused_macros)]
use self::simple_logger::SimpleLogger;

mod simple_logger;

macro_rules! logger_macro {
    ($name:ident is $rule_level:ident to $target:expr, $d:tt) => {
        macro_rules! $name {
            ($d($d arg:tt)+) => (::log::log!(target: $target, ::log::Level::$rule_level, $d($d arg)+));
        }

        pub(crate) use $name;
    };
    ($name:ident is $rule_level:ident to $target:expr) => {
        logger_macro!($name is $rule_level to $target, $);
    };
}

logger_macro!(user_error is Error to "minsh::user");
logger_macro!(user_warn is Warn to "minsh::user");
// logger_macro!(user_info is Info to "minsh::user");

macro_rules! dev_logger_macro {
    ($name:ident is $rule_level:ident to $target:expr, $d:tt) => {
        macro_rules! $name {
            ($d($d arg:tt)+) => {
                if std::cfg!(feature = "dev") {
                    (::log::log!(
                        target: $target,
                        ::log::Level::$rule_level,
                        "{}: {}",
                        std::panic::Location::caller(),
                        format_args!($d($d arg)+)
                    ));
                }
            };
        }

        pub(crate) use $name;
    };
    ($name:ident is $rule_level:ident to $target:expr) => {
        dev_logger_macro!($name is $rule_level to $target, $);
    };
}

dev_logger_macro!(dev_error is Error to "minsh::dev");
dev_logger_macro!(dev_warn is Warn to "minsh::dev");
dev_logger_macro!(dev_info is Info to "minsh::dev");
dev_logger_macro!(dev_debug is Debug to "minsh::dev");

/// Dispatches log records to the sink registered for their target prefix.
#[derive(Default)]
pub struct ShellLogger(Vec<(String, Box<dyn log::Log>)>);

impl ShellLogger {
    pub fn new(prefix: &'static str) -> Self {
        let mut logger: Self = Default::default();

        logger.add_logger("minsh::user", SimpleLogger::to_stderr(prefix));

        #[cfg(feature = "dev")]
        {
            let path = option_env!("MINSH_DEV_LOGS")
                .map(|s| s.into())
                .unwrap_or_else(|| {
                    std::env::temp_dir().join(format!("minsh-dev-{}.log", std::process::id()))
                });
            logger.add_logger("minsh::dev", SimpleLogger::to_file(path, "").unwrap());
        }

        logger
    }

    pub fn into_global_logger(self) {
        log::set_boxed_logger(Box::new(self))
            .map(|()| log::set_max_level(log::LevelFilter::Trace))
            .expect("a global logger was already installed");
    }

    fn add_logger(&mut self, prefix: &str, logger: impl log::Log + 'static) {
        // given a prefix `my::prefix`, we want to match `my::prefix::somewhere`
        // but not `my::prefix_to_somewhere`
        let prefix = if prefix.ends_with("::") {
            prefix.to_string()
        } else {
            format!("{prefix}::")
        };
        self.0.push((prefix, Box::new(logger)))
    }
}

impl log::Log for ShellLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level() && metadata.level() <= log::STATIC_MAX_LEVEL
    }

    fn log(&self, record: &log::Record) {
        for (prefix, logger) in self.0.iter() {
            if record.target() == &prefix[..prefix.len() - 2] || record.target().starts_with(prefix)
            {
                logger.log(record);
            }
        }
    }

    fn flush(&self) {
        for (_, logger) in self.0.iter() {
            logger.flush();
        }
    }
}
