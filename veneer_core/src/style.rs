// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Class names, attribute names, and the base stylesheet.
//!
//! The structure and the reconciler only ever communicate state to CSS
//! through the names below. [`STYLESHEET`] is the minimal sheet that makes the
//! generated structure lay out and hides native scrollbars on the viewport;
//! the web backend injects it once per document.

/// Marks the host (the target element).
pub const HOST: &str = "veneer-host";
/// Marks the padding element.
pub const PADDING: &str = "veneer-padding";
/// Marks the viewport.
pub const VIEWPORT: &str = "veneer-viewport";
/// Marks the content element.
pub const CONTENT: &str = "veneer-content";
/// Marks both scrollbar elements.
pub const SCROLLBAR: &str = "veneer-scrollbar";
/// Marks the horizontal scrollbar.
pub const SCROLLBAR_HORIZONTAL: &str = "veneer-scrollbar-horizontal";
/// Marks the vertical scrollbar.
pub const SCROLLBAR_VERTICAL: &str = "veneer-scrollbar-vertical";
/// Marks a scrollbar's track.
pub const SCROLLBAR_TRACK: &str = "veneer-scrollbar-track";
/// Marks a scrollbar's handle.
pub const SCROLLBAR_HANDLE: &str = "veneer-scrollbar-handle";

/// Set on scrollbars whose axis should be shown.
pub const SCROLLBAR_VISIBLE: &str = "veneer-scrollbar-visible";
/// Set on host and padding when overflowing content may paint outside.
pub const OVERFLOW_VISIBLE: &str = "veneer-overflow-visible";
/// Set on the host when the horizontal axis overflows.
pub const HAS_OVERFLOW_X: &str = "veneer-overflow-x";
/// Set on the host when the vertical axis overflows.
pub const HAS_OVERFLOW_Y: &str = "veneer-overflow-y";
/// Set on the host when its computed direction is right-to-left.
pub const RTL: &str = "veneer-rtl";

/// Attribute identifying the host.
pub const HOST_ATTRIBUTE: &str = "data-veneer";
/// Custom property carrying the client/scroll ratio on a handle.
pub const HANDLE_RATIO: &str = "--veneer-handle-ratio";

/// Base CSS for the generated structure.
pub const STYLESHEET: &str = "\
.veneer-host{position:relative;overflow:hidden}\
.veneer-host.veneer-overflow-visible,.veneer-padding.veneer-overflow-visible{overflow:visible}\
.veneer-padding{position:absolute;top:0;right:0;bottom:0;left:0;overflow:hidden;box-sizing:border-box}\
.veneer-viewport{position:absolute;top:0;right:0;bottom:0;left:0;box-sizing:border-box;\
scrollbar-width:none;outline:none}\
.veneer-viewport::-webkit-scrollbar{display:none;width:0;height:0}\
.veneer-content{box-sizing:border-box}\
.veneer-scrollbar{position:absolute;pointer-events:none;opacity:0}\
.veneer-scrollbar.veneer-scrollbar-visible{pointer-events:auto;opacity:1}\
.veneer-scrollbar-horizontal{left:0;right:0;bottom:0}\
.veneer-scrollbar-vertical{top:0;right:0;bottom:0}\
";
