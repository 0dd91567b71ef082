//! Element types carried by pipelines.
//!
//! Lines are plain `String`s that keep their line terminator. Tuples of
//! fields are [`Fields`], whose arity is only known at runtime.

use std::borrow::Cow;

/// A tuple of fields produced by splitting a line.
pub type Fields = Vec<String>;

/// Write-ready textual form of an element.
///
/// `write` emits `render()` verbatim, `display` prints it verbatim, and
/// `sort` writes it with a line terminator appended when it lacks one.
pub trait Render {
    fn render(&self) -> Cow<'_, str>;
}

impl Render for String {
    fn render(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl Render for &str {
    fn render(&self) -> Cow<'_, str> {
        Cow::Borrowed(*self)
    }
}

/// Fields are joined by a single space and terminated by a newline, unless
/// the last field already carries one (as it does straight after `split`).
impl Render for Fields {
    fn render(&self) -> Cow<'_, str> {
        let mut line = self.join(" ");
        if !line.ends_with('\n') {
            line.push('\n');
        }
        Cow::Owned(line)
    }
}

macro_rules! render_display {
    ($($ty:ty),*) => {
        $(
            impl Render for $ty {
                fn render(&self) -> Cow<'_, str> {
                    Cow::Owned(format!("{self}\n"))
                }
            }
        )*
    };
}

render_display!(i32, i64, u32, u64, usize, f64, char);

/// Render an element as exactly one line of output.
pub(crate) fn render_line<T: Render>(element: &T) -> Cow<'_, str> {
    let text = element.render();
    if text.ends_with('\n') {
        text
    } else {
        Cow::Owned(format!("{text}\n"))
    }
}
