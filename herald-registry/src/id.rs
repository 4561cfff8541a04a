//! Event identifiers

use std::fmt::Debug;

/// A closed set of identifiers naming registry slots.
///
/// `COUNT` is the number of slots; `index` must map every value to a distinct
/// index below it. Usually implemented through [`event_ids!`](crate::event_ids).
pub trait EventId: Copy + Eq + Debug + 'static {
    /// Number of identifiers
    const COUNT: usize;

    /// Slot index of this identifier
    fn index(self) -> usize;
}

/// Declare a fieldless enum and implement [`EventId`] for it.
///
/// # Examples
///
/// ```
/// use herald_registry::{event_ids, EventId};
///
/// event_ids! {
///     /// Editor events
///     pub enum EditorEvent {
///         Opened,
///         Saved,
///         Closed,
///     }
/// }
///
/// assert_eq!(EditorEvent::COUNT, 3);
/// assert_eq!(EditorEvent::Closed.index(), 2);
/// ```
#[macro_export]
macro_rules! event_ids {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$variant_meta])* $variant),+
        }

        impl $crate::EventId for $name {
            const COUNT: usize = [$(stringify!($variant)),+].len();

            fn index(self) -> usize {
                self as usize
            }
        }
    };
}
