use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use syntect::{html::ClassStyle, parsing::SyntaxSet};

use crate::application::render::types::RenderError;

use super::highlight;

#[derive(Debug, Default)]
pub(crate) struct RewriteOutcome {
    pub(crate) highlighted_blocks: u32,
}

/// Replace fenced code blocks that carry a language tag with highlighted HTML.
pub(crate) fn rewrite_ast<'a>(
    root: &'a AstNode<'a>,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<RewriteOutcome, RenderError> {
    let mut walker = RewriteWalker {
        syntax_set,
        class_style,
        outcome: RewriteOutcome::default(),
    };
    walker.visit_nodes(root)?;
    Ok(walker.outcome)
}

struct RewriteWalker<'a> {
    syntax_set: &'a SyntaxSet,
    class_style: &'a ClassStyle,
    outcome: RewriteOutcome,
}

impl RewriteWalker<'_> {
    fn visit_nodes<'n>(&mut self, node: &'n AstNode<'n>) -> Result<(), RenderError> {
        if let Some((language, literal)) = extract_fenced_block(node) {
            let html =
                highlight::highlight_code(&language, &literal, self.syntax_set, self.class_style)?;
            let mut data = node.data.borrow_mut();
            data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
                block_type: 0,
                literal: html,
            });
            self.outcome.highlighted_blocks = self.outcome.highlighted_blocks.saturating_add(1);
        }

        let mut child = node.first_child();
        while let Some(next) = child {
            self.visit_nodes(next)?;
            child = next.next_sibling();
        }

        Ok(())
    }
}

/// Language tag and body of a fenced block, if it names a language.
fn extract_fenced_block(node: &AstNode<'_>) -> Option<(String, String)> {
    let data = node.data.borrow();
    let NodeValue::CodeBlock(block) = &data.value else {
        return None;
    };
    if !block.fenced {
        return None;
    }
    let language = block.info.split_whitespace().next()?.to_string();
    Some((language, block.literal.clone()))
}
