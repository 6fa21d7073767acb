// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod cell;
pub mod html;
pub mod layout;
pub mod place;
pub mod profile;
pub mod text;

pub use cell::*;
pub use layout::{Layout, layout};
pub use place::{PlacedCell, place, with_filler};
pub use profile::{Field, Profile};
pub use text::{GridSheet, PaneLine, Piece, Segment};
pub use html::{escape, escape_grid, to_markup};
