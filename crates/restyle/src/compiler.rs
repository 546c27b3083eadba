//! The source compiler: parsing component source into a [`SyntaxTree`],
//! generating text back from it, and transpiling for the preview.

use std::path::Path;

use facet::Facet;
use oxc::allocator::Allocator;
use oxc::ast::ast::{
    Declaration, ExportDefaultDeclarationKind, Expression, JSXAttributeItem, JSXAttributeName,
    JSXAttributeValue, JSXChild, JSXElement, JSXExpressionContainer, ObjectExpression,
    ObjectPropertyKind, Program, PropertyKey, PropertyKind, Statement,
};
use oxc::ast_visit::Visit;
use oxc::codegen::Codegen;
use oxc::parser::{Parser, ParserReturn};
use oxc::semantic::SemanticBuilder;
use oxc::span::{GetSpan, SourceType};
use oxc::transformer::{JsxRuntime, TransformOptions, Transformer};

use crate::preview::DEFAULT_COMPONENT_NAMES;
use crate::style::{StyleBody, StyleEntry, StyleValue};
use crate::tree::{ChildNode, ElementId, ElementNode, Span, StyleAttr, SyntaxTree};
use crate::{Error, Result};

/// Turns component source into a tree, back into text, and into code the
/// preview can run.
pub trait SourceCompiler: Send + Sync {
    /// Parse source text. Invalid source is an [`Error::Syntax`].
    fn parse(&self, source: &str) -> Result<SyntaxTree>;

    /// Source text for a (possibly edited) tree.
    fn generate(&self, tree: &SyntaxTree) -> Result<String> {
        tree.generate()
    }

    /// Transpile to plain JavaScript and resolve the component to render.
    fn compile_for_execution(
        &self,
        source: &str,
        options: &CompileOptions,
    ) -> Result<CompiledComponent>;
}

/// Options for [`SourceCompiler::compile_for_execution`].
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Stamp `data-source-id` on every intrinsic element
    pub instrument: bool,
    /// Names probed, in order, for the component to render
    pub component_names: Vec<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            instrument: false,
            component_names: DEFAULT_COMPONENT_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Executable code plus the binding the preview should mount.
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct CompiledComponent {
    pub code: String,
    /// `None` when no candidate name or capitalized function is declared
    pub component: Option<String>,
}

/// [`SourceCompiler`] backed by oxc.
#[derive(Debug, Clone)]
pub struct OxcCompiler {
    source_type: SourceType,
}

impl Default for OxcCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl OxcCompiler {
    pub fn new() -> Self {
        Self {
            source_type: SourceType::jsx(),
        }
    }

    /// Use TypeScript + JSX syntax.
    pub fn tsx() -> Self {
        Self {
            source_type: SourceType::tsx(),
        }
    }

    fn parse_program<'a>(&self, allocator: &'a Allocator, source: &'a str) -> Result<ParserReturn<'a>> {
        let ret = Parser::new(allocator, source, self.source_type).parse();
        if ret.panicked || !ret.errors.is_empty() {
            let first_error = ret
                .errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "parser panicked".to_string());
            return Err(Error::Syntax(first_error));
        }
        Ok(ret)
    }
}

impl SourceCompiler for OxcCompiler {
    fn parse(&self, source: &str) -> Result<SyntaxTree> {
        let allocator = Allocator::default();
        let ret = self.parse_program(&allocator, source)?;

        let mut collector = ElementCollector {
            source,
            elements: Vec::new(),
            stack: Vec::new(),
        };
        collector.visit_program(&ret.program);

        tracing::trace!(elements = collector.elements.len(), "parsed source");
        Ok(SyntaxTree::new(source, collector.elements))
    }

    fn compile_for_execution(
        &self,
        source: &str,
        options: &CompileOptions,
    ) -> Result<CompiledComponent> {
        let source = if options.instrument {
            self.parse(source)?.instrumented()?
        } else {
            source.to_string()
        };

        let allocator = Allocator::default();
        let ret = self.parse_program(&allocator, &source)?;
        let mut program = ret.program;

        let component = resolve_component(&program, &options.component_names);

        let scoping = SemanticBuilder::new()
            .build(&program)
            .semantic
            .into_scoping();
        let mut transform_options = TransformOptions::default();
        transform_options.jsx.runtime = JsxRuntime::Classic;
        let transformed = Transformer::new(&allocator, Path::new("component.jsx"), &transform_options)
            .build_with_scoping(scoping, &mut program);
        if let Some(error) = transformed.errors.first() {
            return Err(Error::Syntax(error.to_string()));
        }

        let code = Codegen::new().build(&program).code;
        tracing::debug!(?component, bytes = code.len(), "compiled component");
        Ok(CompiledComponent { code, component })
    }
}

/// Pick the component to render from the unit's top-level bindings: the
/// first candidate name bound to something callable, else the first
/// capitalized function declaration.
fn resolve_component(program: &Program<'_>, candidates: &[String]) -> Option<String> {
    let bindings = top_level_bindings(program);

    candidates
        .iter()
        .find(|name| {
            bindings
                .iter()
                .any(|binding| binding.callable && &binding.name == *name)
        })
        .cloned()
        .or_else(|| {
            bindings
                .iter()
                .find(|binding| {
                    binding.function && binding.name.starts_with(|c: char| c.is_ascii_uppercase())
                })
                .map(|binding| binding.name.clone())
        })
}

struct Binding {
    name: String,
    /// Functions, arrow functions and classes
    callable: bool,
    /// Declared with the `function` keyword
    function: bool,
}

fn top_level_bindings(program: &Program<'_>) -> Vec<Binding> {
    let mut bindings = Vec::new();
    for statement in &program.body {
        match statement {
            Statement::ExportNamedDeclaration(export) => {
                if let Some(declaration) = &export.declaration {
                    declaration_bindings(declaration, &mut bindings);
                }
            }
            Statement::ExportDefaultDeclaration(export) => match &export.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(f) => {
                    if let Some(id) = &f.id {
                        bindings.push(Binding {
                            name: id.name.to_string(),
                            callable: true,
                            function: true,
                        });
                    }
                }
                ExportDefaultDeclarationKind::ClassDeclaration(c) => {
                    if let Some(id) = &c.id {
                        bindings.push(Binding {
                            name: id.name.to_string(),
                            callable: true,
                            function: false,
                        });
                    }
                }
                _ => {}
            },
            other => {
                if let Some(declaration) = other.as_declaration() {
                    declaration_bindings(declaration, &mut bindings);
                }
            }
        }
    }
    bindings
}

fn declaration_bindings(declaration: &Declaration<'_>, bindings: &mut Vec<Binding>) {
    match declaration {
        Declaration::FunctionDeclaration(f) => {
            if let Some(id) = &f.id {
                bindings.push(Binding {
                    name: id.name.to_string(),
                    callable: true,
                    function: true,
                });
            }
        }
        Declaration::ClassDeclaration(c) => {
            if let Some(id) = &c.id {
                bindings.push(Binding {
                    name: id.name.to_string(),
                    callable: true,
                    function: false,
                });
            }
        }
        Declaration::VariableDeclaration(decl) => {
            for declarator in &decl.declarations {
                let Some(name) = declarator.id.get_identifier_name() else {
                    continue;
                };
                let callable = matches!(
                    declarator.init,
                    Some(
                        Expression::ArrowFunctionExpression(_)
                            | Expression::FunctionExpression(_)
                            | Expression::ClassExpression(_)
                    )
                );
                bindings.push(Binding {
                    name: name.to_string(),
                    callable,
                    function: false,
                });
            }
        }
        _ => {}
    }
}

/// Collects JSX elements in depth-first source order.
struct ElementCollector<'s> {
    source: &'s str,
    elements: Vec<ElementNode>,
    /// Enclosing elements of the one being visited
    stack: Vec<ElementId>,
}

impl ElementCollector<'_> {
    fn span(span: oxc::span::Span) -> Span {
        Span::new(span.start as usize, span.end as usize)
    }

    fn text(&self, span: oxc::span::Span) -> &str {
        &self.source[span.start as usize..span.end as usize]
    }

    fn style_attr(&self, item: &JSXAttributeItem<'_>) -> Option<StyleAttr> {
        let JSXAttributeItem::Attribute(attr) = item else {
            return None;
        };
        let JSXAttributeName::Identifier(name) = &attr.name else {
            return None;
        };
        if name.name != "style" {
            return None;
        }

        let literal = StyleAttr::Literal(Self::span(attr.span));
        let Some(JSXAttributeValue::ExpressionContainer(container)) = &attr.value else {
            return Some(literal);
        };
        match container.expression.as_expression() {
            Some(Expression::ObjectExpression(object)) => {
                Some(StyleAttr::Object(self.style_body(object)))
            }
            Some(expression) => Some(StyleAttr::Opaque(Self::span(expression.span()))),
            None => Some(literal),
        }
    }

    fn style_body(&self, object: &ObjectExpression<'_>) -> StyleBody {
        let inner = object.span.start as usize + 1..object.span.end as usize - 1;
        let entries = object
            .properties
            .iter()
            .map(|property| {
                let span = Self::span(property.span());
                let ObjectPropertyKind::ObjectProperty(p) = property else {
                    return StyleEntry::opaque(span.range(), self.text(property.span()));
                };

                let key = match &p.key {
                    PropertyKey::StaticIdentifier(id) => Some(id.name.to_string()),
                    PropertyKey::StringLiteral(s) => Some(s.value.to_string()),
                    _ => None,
                };
                let plain = p.kind == PropertyKind::Init && !p.method && !p.shorthand && !p.computed;
                let Some(key) = key.filter(|_| plain) else {
                    tracing::debug!(entry = self.text(p.span), "keeping style entry as written");
                    return StyleEntry::opaque(span.range(), self.text(p.span));
                };

                let value = match &p.value {
                    Expression::StringLiteral(s) => StyleValue::Str(s.value.to_string()),
                    other => StyleValue::Expr(self.text(other.span()).to_string()),
                };
                StyleEntry {
                    key: Some(key),
                    value,
                    span: span.range(),
                    value_span: Self::span(p.value.span()).range(),
                }
            })
            .collect();
        StyleBody { inner, entries }
    }

    /// Visit a child list, flattening fragments.
    fn visit_children(&mut self, children: &[JSXChild<'_>], out: &mut Vec<ChildNode>) {
        for child in children {
            match child {
                JSXChild::Text(text) => out.push(ChildNode::Text(Self::span(text.span))),
                JSXChild::Element(element) => {
                    out.push(ChildNode::Element(ElementId(self.elements.len())));
                    self.visit_jsx_element(element);
                }
                JSXChild::Fragment(fragment) => self.visit_children(&fragment.children, out),
                JSXChild::ExpressionContainer(container) => {
                    out.push(self.container_child(container));
                    self.visit_jsx_expression_container(container);
                }
                JSXChild::Spread(spread) => {
                    out.push(ChildNode::Expression(Self::span(spread.span)));
                    self.visit_jsx_spread_child(spread);
                }
            }
        }
    }

    fn container_child(&self, container: &JSXExpressionContainer<'_>) -> ChildNode {
        let span = Self::span(container.span);
        match container.expression.as_expression() {
            Some(Expression::StringLiteral(s)) => ChildNode::StringLiteral {
                span,
                value: s.value.to_string(),
            },
            _ => ChildNode::Expression(span),
        }
    }
}

impl<'a> Visit<'a> for ElementCollector<'_> {
    fn visit_jsx_element(&mut self, element: &JSXElement<'a>) {
        let opening = &element.opening_element;
        let id = ElementId(self.elements.len());

        let attr_insert = opening
            .attributes
            .last()
            .map(|attr| attr.span().end)
            .unwrap_or_else(|| opening.name.span().end) as usize;

        let node = ElementNode {
            tag: self.text(opening.name.span()).to_string(),
            span: Self::span(element.span),
            attr_insert,
            content: element
                .closing_element
                .as_ref()
                .map(|closing| Span::new(opening.span.end as usize, closing.span.start as usize)),
            style: opening.attributes.iter().find_map(|item| self.style_attr(item)),
            children: Vec::new(),
            parent: self.stack.last().copied(),
        };
        self.elements.push(node);

        // Elements nested in attribute values belong to the enclosing parent.
        self.visit_jsx_opening_element(opening);

        self.stack.push(id);
        let mut children = Vec::new();
        self.visit_children(&element.children, &mut children);
        self.stack.pop();

        self.elements[id.0].children = children;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error() {
        let err = OxcCompiler::new()
            .parse("function A() { return <div>; }")
            .unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
    }

    #[test]
    fn test_style_object_entries() {
        let tree = OxcCompiler::new()
            .parse("const A = () => <p style={{ color: 'red', 'font-size': size, ...base }}>x</p>;")
            .unwrap();
        let Some(StyleAttr::Object(body)) = &tree.elements()[0].style else {
            panic!("expected an object style");
        };
        let keys: Vec<_> = body.entries.iter().map(|e| e.key.as_deref()).collect();
        assert_eq!(keys, [Some("color"), Some("font-size"), None]);
        assert_eq!(body.entries[0].value, StyleValue::Str("red".into()));
        assert_eq!(body.entries[1].value, StyleValue::Expr("size".into()));
    }

    #[test]
    fn test_opaque_and_literal_styles() {
        let tree = OxcCompiler::new()
            .parse("const A = () => <div style={s.card}><p style=\"color: red\">x</p></div>;")
            .unwrap();
        assert!(matches!(tree.elements()[0].style, Some(StyleAttr::Opaque(_))));
        assert!(matches!(tree.elements()[1].style, Some(StyleAttr::Literal(_))));
    }

    #[test]
    fn test_fragments_flatten() {
        let tree = OxcCompiler::new()
            .parse("const A = () => <div><><b>x</b></></div>;")
            .unwrap();
        assert_eq!(tree.elements()[0].children, [ChildNode::Element(ElementId(1))]);
        assert_eq!(tree.elements()[1].parent, Some(ElementId(0)));
    }

    #[test]
    fn test_attribute_elements_are_not_children() {
        let tree = OxcCompiler::new()
            .parse("const A = () => <div><Button icon={<Icon />}>Go</Button></div>;")
            .unwrap();
        assert_eq!(tree.elements()[2].tag, "Icon");
        assert_eq!(tree.elements()[2].parent, Some(ElementId(0)));
        assert!(!tree.has_element_children(ElementId(1)));
    }

    #[test]
    fn test_compile_resolves_candidate() {
        let compiled = OxcCompiler::new()
            .compile_for_execution(
                "function Helper() { return null; }\nconst App = () => <h1>Hi</h1>;",
                &CompileOptions::default(),
            )
            .unwrap();
        assert_eq!(compiled.component.as_deref(), Some("App"));
        assert!(compiled.code.contains("React.createElement"));
    }

    #[test]
    fn test_compile_falls_back_to_capitalized_function() {
        let compiled = OxcCompiler::new()
            .compile_for_execution(
                "const x = 1;\nfunction helper() {}\nexport function Card() { return <div />; }",
                &CompileOptions::default(),
            )
            .unwrap();
        assert_eq!(compiled.component.as_deref(), Some("Card"));
    }

    #[test]
    fn test_compile_without_component() {
        let compiled = OxcCompiler::new()
            .compile_for_execution("const App = 42;", &CompileOptions::default())
            .unwrap();
        assert_eq!(compiled.component, None);
    }

    #[test]
    fn test_compile_instrumented() {
        let options = CompileOptions {
            instrument: true,
            ..Default::default()
        };
        let compiled = OxcCompiler::new()
            .compile_for_execution("function MyComponent() { return <p>Hi</p>; }", &options)
            .unwrap();
        assert!(compiled.code.contains("data-source-id"));
    }
}
