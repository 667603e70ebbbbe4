//! Prelude module for Horizon Forms.
//!
//! ```ignore
//! use horizon_forms::prelude::*;
//! ```
//!
//! This provides access to:
//! - The derive macros (`Bindable`, `FormEnum`) and their traits
//! - Form generation (`FormGenerator`, `FormContext`, `FormConfig`)
//! - Edits and their outcomes (`Edit`, `CommitOutcome`)

// ============================================================================
// Derives and Traits
// ============================================================================

pub use horizon_forms_macros::{Bindable, FormEnum};
pub use horizon_forms_core::{AttributeDescriptor, Bindable, FormEnum, FormField};

// ============================================================================
// Generation
// ============================================================================

pub use horizon_forms_core::{
    Form, FormConfig, FormContext, FormGenerator, LayoutStrategy, WidgetId, WidgetKind,
};

// ============================================================================
// Editing
// ============================================================================

pub use horizon_forms_core::{CommitOutcome, Edit, FormError};

pub use crate::{RwLock, bind};
