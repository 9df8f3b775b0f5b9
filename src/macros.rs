//! Macros for reducing boilerplate across descriptor kinds.
//!
//! Provides `for_each_kind!`, which expands a single expression over every
//! [`Descriptor`](crate::descriptor::Descriptor) variant so accessors that
//! only touch the shared [`Placement`](crate::descriptor::Placement) block
//! are written once.
//!
//! # Examples
//!
//! ```rust,ignore
//! fn placement(descriptor: &Descriptor) -> &Placement {
//!     for_each_kind!(descriptor, inner => &inner.placement)
//! }
//! ```
macro_rules! for_each_kind {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            $crate::descriptor::Descriptor::Primitive($inner) => $body,
            $crate::descriptor::Descriptor::Light($inner) => $body,
            $crate::descriptor::Descriptor::Door($inner) => $body,
            $crate::descriptor::Descriptor::Workstation($inner) => $body,
            $crate::descriptor::Descriptor::ItemSpawnpoint($inner) => $body,
            $crate::descriptor::Descriptor::PlayerSpawnpoint($inner) => $body,
            $crate::descriptor::Descriptor::InteractiveProp($inner) => $body,
            $crate::descriptor::Descriptor::Text($inner) => $body,
            $crate::descriptor::Descriptor::Camera($inner) => $body,
            $crate::descriptor::Descriptor::ShootingTarget($inner) => $body,
            $crate::descriptor::Descriptor::SubScene($inner) => $body,
            $crate::descriptor::Descriptor::Teleport($inner) => $body,
        }
    };
}

pub(crate) use for_each_kind;
