//! Annotation editor core for the field-report app.
//!
//! This crate is compiled to WebAssembly and runs in the browser, but all of
//! its state logic runs natively too: drawing goes through the [`layer::Layer`]
//! trait, and only [`render`] and the [`engine::Editor`] wrapper touch the DOM.
//! The host JavaScript layer wires DOM events to the editor, lays out the text
//! box overlay, and carries out the returned [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Editing session ([`engine::EditorCore`]) and the browser [`engine::Editor`] |
//! | [`signature`] | Pen-only signature pad with its own history and store key |
//! | [`surface`] | Layer stack, strokes, eraser and export flattening |
//! | [`history`] | Debounced, capped undo/redo stack |
//! | [`tool`] | Active tool, per-tool settings and gesture state |
//! | [`text`] | Text boxes on the DOM overlay |
//! | [`shape`] | Vector marks and colours |
//! | [`paint`] | Turning shapes and cursors into paths |
//! | [`hit`] | Eraser hit-testing |
//! | [`coords`] | CSS / backing / normalized coordinate mapping |
//! | [`layer`] | The raster layer abstraction |
//! | [`render`] | `HtmlCanvasElement` implementation of [`layer::Layer`] |
//! | [`record`] | Persisted annotation record and export bundle |
//! | [`config`] | Editor configuration |
//! | [`consts`] | Shared numeric constants |

pub mod config;
pub mod consts;
pub mod coords;
pub mod engine;
pub mod history;
pub mod hit;
pub mod layer;
pub mod paint;
pub mod record;
pub mod render;
pub mod shape;
pub mod signature;
pub mod surface;
pub mod text;
pub mod tool;

#[cfg(test)]
pub(crate) mod testing;
