use hcl::eval::{Context, Evaluate};
use hcl_edit::Span;
use hcl_edit::expr::{Expression, ObjectKey, TraversalOperator};
use hcl_edit::template::Element;
use hcl_edit::structure::{Attribute, Block, BlockLabel, Body};

use crate::error::{LintError, Result};
use crate::format::format;
use crate::source::{SourceFile, SourceRange};

/// Shared helpers for rules working on `hcl-edit` syntax trees
pub struct TerraformUtils;

impl TerraformUtils {
    /// Text of a label without quotes
    pub fn label_str(label: &BlockLabel) -> &str {
        match label {
            BlockLabel::String(s) => s.value().as_str(),
            BlockLabel::Ident(ident) => ident.value().as_str(),
        }
    }

    pub fn first_label(block: &Block) -> Option<&str> {
        block.labels.first().map(Self::label_str)
    }

    pub fn block_type(block: &Block) -> &str {
        block.ident.value().as_str()
    }

    /// First top level block of another type than `ident`
    pub fn first_block_not_of<'b>(body: &'b Body, ident: &str) -> Option<&'b Block> {
        body.blocks().find(|block| Self::block_type(block) != ident)
    }

    /// `type "label" "label"`, rebuilt from the parsed block
    pub fn block_header(block: &Block) -> String {
        let mut header = block.ident.value().as_str().to_string();
        for label in &block.labels {
            header.push_str(&format!(" \"{}\"", Self::label_str(label)));
        }
        header
    }

    /// Range of the block type and labels, up to (not including) the opening brace
    pub fn def_range(file: &SourceFile, block: &Block) -> SourceRange {
        let Some(span) = block.span() else {
            return SourceRange::default();
        };
        let text = file.text().get(span.clone()).unwrap_or_default();
        let mut end = text.len();
        let mut in_quote = false;
        let mut escaped = false;
        for (i, c) in text.char_indices() {
            if in_quote {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_quote = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_quote = true,
                '{' => {
                    end = i;
                    break;
                }
                _ => {}
            }
        }
        file.range(span.start..span.start + end)
    }

    /// Range of the attribute key alone
    pub fn key_range(file: &SourceFile, attr: &Attribute) -> SourceRange {
        file.range_of(&attr.key)
    }

    /// Attributes of a body ordered by where they start in the source
    pub fn attributes_by_lines(body: &Body) -> Vec<&Attribute> {
        let mut attrs: Vec<&Attribute> = body.attributes().collect();
        attrs.sort_by_key(|attr| attr.span().map_or(0, |span| span.start));
        attrs
    }

    /// Every attribute of the body and of all blocks nested in it, depth first
    pub fn all_attributes(body: &Body) -> Vec<&Attribute> {
        let mut attrs: Vec<&Attribute> = body.attributes().collect();
        for block in body.blocks() {
            attrs.extend(Self::all_attributes(&block.body));
        }
        attrs
    }

    /// Direct sub-expressions of `expr`. Template directives are not entered.
    pub fn sub_expressions(expr: &Expression) -> Vec<&Expression> {
        match expr {
            Expression::Null(_)
            | Expression::Bool(_)
            | Expression::Number(_)
            | Expression::String(_)
            | Expression::Variable(_) => Vec::new(),
            Expression::Array(array) => array.iter().collect(),
            Expression::Object(object) => {
                let mut exprs = Vec::new();
                for (key, value) in object.iter() {
                    if let ObjectKey::Expression(key) = key {
                        exprs.push(key);
                    }
                    exprs.push(value.expr());
                }
                exprs
            }
            Expression::StringTemplate(template) => template
                .iter()
                .filter_map(|element| match element {
                    Element::Interpolation(interp) => Some(&interp.expr),
                    _ => None,
                })
                .collect(),
            Expression::HeredocTemplate(heredoc) => heredoc
                .template
                .iter()
                .filter_map(|element| match element {
                    Element::Interpolation(interp) => Some(&interp.expr),
                    _ => None,
                })
                .collect(),
            Expression::Parenthesis(paren) => vec![paren.inner()],
            Expression::Conditional(cond) => {
                vec![&cond.cond_expr, &cond.true_expr, &cond.false_expr]
            }
            Expression::FuncCall(call) => call.args.iter().collect(),
            Expression::Traversal(traversal) => {
                let mut exprs = vec![&traversal.expr];
                for op in &traversal.operators {
                    if let TraversalOperator::Index(index) = op.value() {
                        exprs.push(index);
                    }
                }
                exprs
            }
            Expression::UnaryOp(op) => vec![&op.expr],
            Expression::BinaryOp(op) => vec![&op.lhs_expr, &op.rhs_expr],
            Expression::ForExpr(for_expr) => {
                let mut exprs = vec![&for_expr.intro.collection_expr];
                if let Some(key) = &for_expr.key_expr {
                    exprs.push(key);
                }
                exprs.push(&for_expr.value_expr);
                if let Some(cond) = &for_expr.cond {
                    exprs.push(&cond.expr);
                }
                exprs
            }
        }
    }

    /// Remove spaces, tabs and newlines
    /// Evaluates an attribute's value with no variables or functions in
    /// scope. References to anything else are evaluation errors.
    pub fn evaluate(file: &SourceFile, attr: &Attribute) -> Result<hcl::Value> {
        let evaluation_error = |message: String| LintError::Evaluation {
            file: file.name().to_string(),
            attribute: attr.key.as_str().to_string(),
            message,
        };
        let body =
            hcl::parse(file.text_of(attr)).map_err(|err| evaluation_error(err.to_string()))?;
        let Some(parsed) = body.attributes().next() else {
            return Ok(hcl::Value::Null);
        };
        parsed
            .expr()
            .evaluate(&Context::new())
            .map_err(|err| evaluation_error(err.to_string()))
    }

    pub fn remove_space_and_line(s: &str) -> String {
        s.chars()
            .filter(|c| !matches!(c, ' ' | '\t' | '\n' | '\r'))
            .collect()
    }

    fn object_key_text<'f>(file: &'f SourceFile, key: &ObjectKey) -> &'f str {
        match key {
            ObjectKey::Ident(ident) => file.text_of(ident),
            ObjectKey::Expression(expr) => file.text_of(expr),
        }
    }

    /// Prints a map-valued attribute with its keys sorted.
    ///
    /// Returns the formatted text and whether the keys already were in order.
    /// Anything but an object literal is returned verbatim and counts as sorted.
    pub fn print_sorted_attr_txt(file: &SourceFile, attr: &Attribute) -> (String, bool) {
        let Expression::Object(object) = &attr.value else {
            return (file.text_of(attr).to_string(), true);
        };
        let mut entries: Vec<(&str, String)> = object
            .iter()
            .map(|(key, value)| {
                let key = Self::object_key_text(file, key);
                (key, format!("{key} = {}", file.text_of(value.expr())))
            })
            .collect();
        let sorted = entries.is_sorted_by(|a, b| a.0 <= b.0);
        if !sorted {
            entries.sort_by(|a, b| a.0.cmp(b.0));
        }
        let body = entries
            .into_iter()
            .map(|(_, entry)| entry)
            .collect::<Vec<_>>()
            .join("\n");
        let name = attr.key.as_str();
        let text = if Self::remove_space_and_line(&body).is_empty() {
            format!("{name} = {{}}")
        } else {
            format!("{name} = {{\n{body}\n}}")
        };
        (format(&text), sorted)
    }
}
