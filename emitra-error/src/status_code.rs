use std::fmt;

use num_enum::TryFromPrimitive;

/// Числовой код, по которому ошибки эмиттера различаются без downcast.
///
/// Коды сгруппированы по сотням:
/// - `1xx`: общие (неверные аргументы, внутренние сбои);
/// - `2xx`: реестр событий и каналов;
/// - `3xx`: вызов слушателей и планировщик;
/// - `4xx`: конфигурация.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u16)]
#[non_exhaustive]
pub enum StatusCode {
    Internal = 100,
    InvalidArgs = 101,

    ChannelNotFound = 200,
    /// Выдаётся вместе с предупреждением об утечке слушателей.
    ListenerLimitExceeded = 201,

    CallbackPanicked = 300,
    ScheduleFailed = 301,
    SchedulerUnavailable = 302,

    ConfigInvalid = 400,
    ConfigLoadFailed = 401,
}

impl StatusCode {
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Группа кода: `1` для общих, `2` для реестра и т.д.
    pub const fn group(self) -> u16 {
        self.code() / 100
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "E{}:{:?}", self.code(), self)
    }
}
