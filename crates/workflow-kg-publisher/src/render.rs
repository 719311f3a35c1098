//! Document renderer interface.
//!
//! Rendering and styling of the final document is an external concern; the
//! pipeline only fixes the interface: the fully resolved answers of one run
//! plus a template selector derived from the workflow kind. [`PlainRenderer`]
//! is the built-in fallback used by the CLI and the tests; it dumps the
//! resolved answers without any styling.

use crate::builder::WorkflowContext;
use crate::models::WorkflowKind;

/// Which document template to render with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Template for mathematical workflows.
    Mathematical,
    /// Template for experimental workflows.
    Experimental,
}

impl From<WorkflowKind> for TemplateKind {
    fn from(kind: WorkflowKind) -> Self {
        match kind {
            WorkflowKind::Mathematical => Self::Mathematical,
            WorkflowKind::Experimental => Self::Experimental,
        }
    }
}

/// Renders the resolved context into the final document text.
pub trait DocumentRenderer: Send + Sync {
    /// Render the context with the selected template.
    fn render(&self, context: &WorkflowContext, template: TemplateKind) -> String;
}

/// Unstyled renderer: one `key: value` line per resolved answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl DocumentRenderer for PlainRenderer {
    fn render(&self, context: &WorkflowContext, template: TemplateKind) -> String {
        let mut output = format!("workflow ({template:?})\n\n");
        for (key, value) in context.answers.iter() {
            if value.is_empty() {
                continue;
            }
            output.push_str(&format!("{key}: {value}\n"));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnswerMap;

    #[test]
    fn test_plain_renderer_skips_empty_answers() {
        let mut answers = AnswerMap::new();
        answers.insert("general/workflow/title", "Heat flow study");
        answers.insert("workflow/model/entity", "");
        let context = WorkflowContext::new(answers);

        let document = PlainRenderer.render(&context, TemplateKind::Mathematical);
        assert!(document.contains("general/workflow/title: Heat flow study"));
        assert!(!document.contains("workflow/model/entity"));
    }

    #[test]
    fn test_template_kind_from_workflow_kind() {
        assert_eq!(TemplateKind::from(WorkflowKind::Experimental), TemplateKind::Experimental);
    }
}
