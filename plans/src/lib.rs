//! Floor-plan viewer core: PDF plan pages, pins and pin-to-card links.
//!
//! A report carries any number of floor-plan cards (one per uploaded PDF),
//! each holding extracted plan pages. Users drop pins on a page and link each
//! pin to at most one report item. Pin positions are normalized to the page's
//! native size, so they survive any pan or zoom of the viewer.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`viewer`] | Viewer session: tools, pointer handling, pin glyphs |
//! | [`link`] | Pin placement / selection / link state machine |
//! | [`pins`] | In-memory pin set with exclusive card links |
//! | [`camera`] | Pan and zoom of the plan image |
//! | [`palette`] | Non-repeating pin head colours |
//! | [`model`] | Floor-plan cards, plans and pins as persisted |
//! | [`repo`] | Report-scoped persistence over a `KeyValueStore` |
//! | [`config`] | Viewer configuration |

pub mod camera;
pub mod config;
pub mod link;
pub mod model;
pub mod palette;
pub mod pins;
pub mod repo;
pub mod viewer;
