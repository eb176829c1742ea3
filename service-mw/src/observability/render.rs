//! Defensive rendering of request and response values for log lines.
//!
//! Types opt into a readable rendering by implementing [`LogValue`]. The
//! default implementation prints only the type name, so a value can always
//! be rendered without relying on `Debug`. Rendering never panics: a
//! formatting error or a panicking formatter degrades to the placeholder.

use std::any::type_name;
use std::fmt::{self, Write};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Rendered in place of a missing value.
pub const NIL: &str = "<nil>";

/// A value that can be rendered into a log line.
pub trait LogValue {
    fn fmt_log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{..}}", type_name::<Self>())
    }
}

/// Render `value` for a log line. Always succeeds.
pub fn render<T: LogValue + ?Sized>(value: &T) -> String {
    render_with(|f| value.fmt_log(f)).unwrap_or_else(|| placeholder::<T>())
}

/// Render a `Display` value (such as an error message). Always succeeds.
pub fn render_display<T: fmt::Display + ?Sized>(value: &T) -> String {
    render_with(|f| fmt::Display::fmt(value, f)).unwrap_or_else(|| placeholder::<T>())
}

fn placeholder<T: ?Sized>() -> String {
    format!("{}{{!render}}", type_name::<T>())
}

fn render_with<F>(render: F) -> Option<String>
where
    F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
{
    struct Adapter<F>(F);

    impl<F> fmt::Display for Adapter<F>
    where
        F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
    {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            (self.0)(f)
        }
    }

    catch_unwind(AssertUnwindSafe(|| {
        let mut out = String::new();
        write!(out, "{}", Adapter(&render)).ok().map(|_| out)
    }))
    .ok()
    .flatten()
}

/// Implement [`LogValue`] for the listed types using their `Debug` output.
#[macro_export]
macro_rules! log_value_debug {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::observability::LogValue for $ty {
                fn fmt_log(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    ::std::write!(f, "{:?}", self)
                }
            }
        )+
    };
}

macro_rules! log_value_display {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl LogValue for $ty {
                fn fmt_log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Display::fmt(self, f)
                }
            }
        )+
    };
}

log_value_display!(
    str, String, bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32,
    f64, serde_json::Value,
);

impl LogValue for () {
    fn fmt_log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{}")
    }
}

impl<T: LogValue> LogValue for Option<T> {
    fn fmt_log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Some(value) => value.fmt_log(f),
            None => f.write_str(NIL),
        }
    }
}

impl<T: LogValue> LogValue for [T] {
    fn fmt_log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            item.fmt_log(f)?;
        }
        f.write_str("]")
    }
}

impl<T: LogValue> LogValue for Vec<T> {
    fn fmt_log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_slice().fmt_log(f)
    }
}

impl<T: LogValue + ?Sized> LogValue for &T {
    fn fmt_log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).fmt_log(f)
    }
}

impl<T: LogValue + ?Sized> LogValue for Box<T> {
    fn fmt_log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).fmt_log(f)
    }
}

impl<T: LogValue + ?Sized> LogValue for Arc<T> {
    fn fmt_log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).fmt_log(f)
    }
}
