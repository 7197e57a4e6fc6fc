//! Описание событий на уровне типов.
//!
//! Каждое событие - отдельный тип, реализующий [`Event`]: он связывает имя
//! события с типом аргументов и типом значения, которое возвращает слушатель.
//! Благодаря этому `emit::<E>` и `subscribe::<E, _>` проверяются компилятором,
//! а реестру не нужно инспектировать типы во время выполнения.

use emitra_error::CallbackError;

/// Дескриптор события.
pub trait Event: 'static {
    /// Имя события (для диагностики и `event_names()`).
    ///
    /// Слушатели хранятся по типу, а не по имени: два типа с одинаковым
    /// `NAME` остаются разными событиями, но в `event_names()` имя
    /// встречается один раз.
    const NAME: &'static str;

    /// Аргументы, передаваемые слушателям по ссылке.
    ///
    /// `Clone` нужен отложенным слушателям: они получают собственную копию
    /// аргументов, которая живёт до срабатывания таймера.
    type Args: Clone + Send + Sync + 'static;

    /// Значение, которое возвращает каждый слушатель.
    type Output: Send + 'static;
}

/// Результат одного `emit`: по позиции на каждого слушателя, давшего
/// синхронный результат, в порядке обхода.
pub type EmitResult<E> = Vec<Result<<E as Event>::Output, CallbackError>>;

/// Объявляет unit-структуру, реализующую [`Event`].
///
/// ```
/// use emitra::define_event;
///
/// define_event!(pub UserCreated = "userCreated", (u64, String) => bool);
/// define_event!(Tick = "tick", u32);
/// ```
#[macro_export]
macro_rules! define_event {
    ($(#[$meta:meta])* $vis:vis $ty:ident = $name:literal, $args:ty => $out:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $ty;

        impl $crate::Event for $ty {
            const NAME: &'static str = $name;
            type Args = $args;
            type Output = $out;
        }
    };
    ($(#[$meta:meta])* $vis:vis $ty:ident = $name:literal, $args:ty) => {
        $crate::define_event!($(#[$meta])* $vis $ty = $name, $args => ());
    };
}
