use mailframe_tree::{ComponentKind, GlobalSettings, Node, Path, Registry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Errors that can occur while assembling documents
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Document has no {0} slot")]
    MissingSlot(&'static str),
}

/// Options for HTML rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// Pretty print HTML
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            indent: "  ".to_string(),
        }
    }
}

/// Rendered markup plus non-fatal problems found on the way
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutput {
    pub html: String,
    pub warnings: Vec<String>,
}

struct Context<'a> {
    options: &'a RenderOptions,
    settings: &'a GlobalSettings,
    registry: &'a Registry,
    depth: usize,
    buffer: String,
    warnings: Vec<String>,
    /// Preview nodes collected from the head, emitted at the top of the body
    previews: Vec<&'a Node>,
}

impl<'a> Context<'a> {
    fn new(options: &'a RenderOptions, settings: &'a GlobalSettings, registry: &'a Registry) -> Self {
        Self {
            options,
            settings,
            registry,
            depth: 0,
            buffer: String::new(),
            warnings: Vec::new(),
            previews: Vec::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_line(&mut self, text: &str) {
        if self.options.pretty {
            self.add_indent();
        }
        self.add(text);
        if self.options.pretty {
            self.add("\n");
        }
    }

    fn add_indent(&mut self) {
        for _ in 0..self.depth {
            self.buffer.push_str(&self.options.indent);
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    fn warn(&mut self, message: String) {
        warn!(warning = %message, "render warning");
        self.warnings.push(message);
    }

    fn into_output(self) -> RenderOutput {
        RenderOutput {
            html: self.buffer,
            warnings: self.warnings,
        }
    }
}

/// Renders component trees to table-based email markup.
///
/// Output depends only on the tree, the settings and the options: no
/// clocks, no randomness, and every map iterated is ordered.
pub struct Renderer<'r> {
    registry: &'r Registry,
}

impl<'r> Renderer<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    #[instrument(skip_all, fields(root = %root.id))]
    pub fn render(&self, root: &Node, settings: &GlobalSettings, options: &RenderOptions) -> RenderOutput {
        let mut ctx = Context::new(options, settings, self.registry);
        render_node(root, Path::root(), &mut ctx);
        flush_previews(&mut ctx);

        let output = ctx.into_output();
        debug!(bytes = output.html.len(), warnings = output.warnings.len(), "render complete");
        output
    }
}

/// Render with the standard registry
pub fn render(root: &Node, settings: &GlobalSettings, options: &RenderOptions) -> RenderOutput {
    let registry = Registry::standard();
    Renderer::new(&registry).render(root, settings, options)
}

fn render_node<'a>(node: &'a Node, path: Path, ctx: &mut Context<'a>) {
    let Some(kind) = ctx.registry.kind_of(&node.component_type) else {
        render_unknown(node, path, ctx);
        return;
    };

    match kind {
        ComponentKind::Email => render_email(node, path, ctx),
        ComponentKind::Head => render_head(node, path, ctx),
        ComponentKind::Body => render_body(node, path, ctx),
        ComponentKind::Preview => {
            let mut style = StyleList::new();
            style.set("display", "none");
            style.set("overflow", "hidden");
            style.set("line-height", "1px");
            style.set("opacity", "0");
            style.set("max-height", "0");
            style.set("max-width", "0");
            let text = escape_html(node.content.as_deref().unwrap_or_default());
            ctx.add_line(&format!("<div{}>{}</div>", attrs(&[("style", style.to_css())]), text));
        }
        ComponentKind::Container => {
            let mut style = StyleList::new();
            style.set("max-width", format!("{}px", ctx.settings.max_width));
            style.set("margin", "0 auto");
            apply_node_style(&mut style, node, &path, ctx);

            let align = prop_str(node, "align").unwrap_or("center").to_string();
            ctx.add_line(&format!(
                "<table{}>",
                table_attrs(vec![("align", align), ("style", style.to_css())])
            ));
            render_table_cell(node, &path, Vec::new(), ctx);
            ctx.add_line("</table>");
        }
        ComponentKind::Section => {
            let mut style = StyleList::new();
            apply_node_style(&mut style, node, &path, ctx);

            let mut cell = Vec::new();
            if let Some(align) = prop_str(node, "align") {
                cell.push(("align", align.to_string()));
            }
            if let Some(color) = prop_str(node, "backgroundColor") {
                cell.push(("bgcolor", color.to_string()));
            }
            cell.push(("style", style.to_css()));

            ctx.add_line(&format!("<table{}>", table_attrs(Vec::new())));
            render_table_cell(node, &path, cell, ctx);
            ctx.add_line("</table>");
        }
        ComponentKind::Row => {
            ctx.add_line(&format!("<table{}>", table_attrs(Vec::new())));
            ctx.indent();
            ctx.add_line("<tr>");
            ctx.indent();
            render_children(node, &path, ctx);
            ctx.dedent();
            ctx.add_line("</tr>");
            ctx.dedent();
            ctx.add_line("</table>");
        }
        ComponentKind::Column => {
            let mut style = StyleList::new();
            apply_node_style(&mut style, node, &path, ctx);

            let mut cell = vec![(
                "valign",
                prop_str(node, "valign").unwrap_or("top").to_string(),
            )];
            if let Some(width) = node.props.get("width").and_then(scalar) {
                cell.push(("width", width));
            }
            if let Some(align) = prop_str(node, "align") {
                cell.push(("align", align.to_string()));
            }
            cell.push(("style", style.to_css()));

            ctx.add_line(&format!("<td{}>", attrs(&cell)));
            ctx.indent();
            render_children(node, &path, ctx);
            ctx.dedent();
            ctx.add_line("</td>");
        }
        ComponentKind::Heading => {
            let level = node
                .props
                .get("level")
                .and_then(Value::as_u64)
                .unwrap_or(1)
                .clamp(1, 6);

            let mut style = StyleList::new();
            style.set("margin", "0 0 12px");
            style.set("font-family", ctx.settings.font_family.clone());
            style.set("color", ctx.settings.primary_color.clone());
            if let Some(align) = prop_str(node, "align") {
                style.set("text-align", align);
            }
            apply_node_style(&mut style, node, &path, ctx);

            let text = text_content(node);
            ctx.add_line(&format!(
                "<h{level}{}>{}</h{level}>",
                attrs(&[("style", style.to_css())]),
                text
            ));
        }
        ComponentKind::Text => {
            let mut style = StyleList::new();
            style.set("margin", "0 0 16px");
            style.set("font-family", ctx.settings.font_family.clone());
            style.set("font-size", "16px");
            style.set("line-height", "24px");
            style.set("color", "#333333");
            if let Some(align) = prop_str(node, "align") {
                style.set("text-align", align);
            }
            apply_node_style(&mut style, node, &path, ctx);

            let text = text_content(node);
            ctx.add_line(&format!("<p{}>{}</p>", attrs(&[("style", style.to_css())]), text));
        }
        ComponentKind::Button => render_button(node, &path, ctx),
        ComponentKind::Image => render_image(node, &path, ctx),
        ComponentKind::Divider => {
            let color = prop_str(node, "color")
                .map(str::to_string)
                .unwrap_or_else(|| ctx.settings.secondary_color.clone());

            let mut style = StyleList::new();
            style.set("border", "none");
            style.set("border-top", format!("1px solid {}", color));
            style.set("margin", "16px 0");
            apply_node_style(&mut style, node, &path, ctx);

            ctx.add_line(&format!("<hr{} />", attrs(&[("style", style.to_css())])));
        }
        ComponentKind::Spacer => {
            let height = node.props.get("height").and_then(Value::as_u64).unwrap_or(16);

            let mut style = StyleList::new();
            style.set("height", format!("{}px", height));
            style.set("line-height", format!("{}px", height));
            style.set("font-size", "1px");
            apply_node_style(&mut style, node, &path, ctx);

            ctx.add_line(&format!("<div{}>&nbsp;</div>", attrs(&[("style", style.to_css())])));
        }
    }
}

fn render_email<'a>(node: &'a Node, path: Path, ctx: &mut Context<'a>) {
    ctx.add_line("<!DOCTYPE html>");

    let mut html_attrs = vec![(
        "lang",
        prop_str(node, "lang").unwrap_or("en").to_string(),
    )];
    if let Some(dir) = prop_str(node, "dir") {
        html_attrs.push(("dir", dir.to_string()));
    }
    ctx.add_line(&format!("<html{}>", attrs(&html_attrs)));
    ctx.indent();

    let has_head = node
        .children()
        .iter()
        .any(|child| ctx.registry.kind_of(&child.component_type) == Some(ComponentKind::Head));
    if !has_head {
        render_head_open(None, ctx);
        ctx.add_line("</head>");
    }

    render_children(node, &path, ctx);
    flush_previews(ctx);

    ctx.dedent();
    ctx.add_line("</html>");
}

fn render_head_open(title: Option<&str>, ctx: &mut Context<'_>) {
    ctx.add_line("<head>");
    ctx.indent();
    ctx.add_line("<meta charset=\"UTF-8\">");
    ctx.add_line("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">");
    ctx.add_line("<meta http-equiv=\"X-UA-Compatible\" content=\"IE=edge\">");
    if let Some(title) = title {
        ctx.add_line(&format!("<title>{}</title>", escape_html(title)));
    }
    ctx.dedent();
}

fn render_head<'a>(node: &'a Node, path: Path, ctx: &mut Context<'a>) {
    render_head_open(prop_str(node, "title"), ctx);
    ctx.indent();
    for (index, child) in node.children().iter().enumerate() {
        if ctx.registry.kind_of(&child.component_type) == Some(ComponentKind::Preview) {
            ctx.previews.push(child);
        } else {
            render_node(child, path.child(index), ctx);
        }
    }
    ctx.dedent();
    ctx.add_line("</head>");
}

fn render_body<'a>(node: &'a Node, path: Path, ctx: &mut Context<'a>) {
    let mut style = StyleList::new();
    style.set("margin", "0");
    style.set("padding", "0");
    style.set("background-color", ctx.settings.background_color.clone());
    style.set("font-family", ctx.settings.font_family.clone());
    apply_node_style(&mut style, node, &path, ctx);

    ctx.add_line(&format!("<body{}>", attrs(&[("style", style.to_css())])));
    ctx.indent();
    flush_previews(ctx);

    let bgcolor = ctx.settings.background_color.clone();
    ctx.add_line(&format!("<table{}>", table_attrs(vec![("bgcolor", bgcolor)])));
    render_table_cell(node, &path, vec![("align", "center".to_string())], ctx);
    ctx.add_line("</table>");

    ctx.dedent();
    ctx.add_line("</body>");
}

fn flush_previews(ctx: &mut Context<'_>) {
    let previews = std::mem::take(&mut ctx.previews);
    for preview in previews {
        render_node(preview, Path::root(), ctx);
    }
}

fn render_button(node: &Node, path: &Path, ctx: &mut Context<'_>) {
    let href = prop_str(node, "href").unwrap_or("#").to_string();

    let mut cell_style = StyleList::new();
    cell_style.set("border-radius", "4px");
    cell_style.set("background-color", ctx.settings.primary_color.clone());

    let mut link_style = StyleList::new();
    link_style.set("display", "inline-block");
    link_style.set("padding", "12px 24px");
    link_style.set("font-family", ctx.settings.font_family.clone());
    link_style.set("font-size", "16px");
    link_style.set("color", "#ffffff");
    link_style.set("text-decoration", "none");
    apply_node_style(&mut link_style, node, path, ctx);

    let mut link_attrs = vec![("href", href)];
    if let Some(target) = prop_str(node, "target") {
        link_attrs.push(("target", target.to_string()));
    }
    link_attrs.push(("style", link_style.to_css()));

    let align = prop_str(node, "align").unwrap_or("left").to_string();
    ctx.add_line(&format!(
        "<table{}>",
        attrs(&[
            ("role", "presentation".to_string()),
            ("cellpadding", "0".to_string()),
            ("cellspacing", "0".to_string()),
            ("border", "0".to_string()),
            ("align", align),
        ])
    ));
    ctx.indent();
    ctx.add_line("<tr>");
    ctx.indent();
    ctx.add_line(&format!(
        "<td{}><a{}>{}</a></td>",
        attrs(&[("style", cell_style.to_css())]),
        attrs(&link_attrs),
        text_content(node)
    ));
    ctx.dedent();
    ctx.add_line("</tr>");
    ctx.dedent();
    ctx.add_line("</table>");
}

fn render_image(node: &Node, path: &Path, ctx: &mut Context<'_>) {
    let mut style = StyleList::new();
    style.set("display", "block");
    style.set("border", "0");
    style.set("outline", "none");
    style.set("max-width", "100%");
    apply_node_style(&mut style, node, path, ctx);

    let mut img = vec![
        ("src", prop_str(node, "src").unwrap_or_default().to_string()),
        ("alt", prop_str(node, "alt").unwrap_or_default().to_string()),
    ];
    for key in ["width", "height"] {
        if let Some(value) = node.props.get(key).and_then(scalar) {
            img.push((key, value));
        }
    }
    img.push(("style", style.to_css()));

    let tag = format!("<img{} />", attrs_keep_empty(&img, &["alt"]));
    match prop_str(node, "href") {
        Some(href) => ctx.add_line(&format!(
            "<a{}>{}</a>",
            attrs(&[("href", href.to_string())]),
            tag
        )),
        None => ctx.add_line(&tag),
    }
}

fn render_unknown<'a>(node: &'a Node, path: Path, ctx: &mut Context<'a>) {
    ctx.warn(format!(
        "{}: unknown component type '{}' (id '{}') rendered as placeholder",
        path, node.component_type, node.id
    ));

    let mut style = StyleList::new();
    style.set("border", "1px dashed #dc2626");
    style.set("padding", "8px");
    style.set("color", "#dc2626");
    style.set("font-family", "monospace");

    ctx.add_line(&format!(
        "<div{}>",
        attrs(&[
            ("data-unknown-component", node.component_type.clone()),
            ("style", style.to_css()),
        ])
    ));
    ctx.indent();
    ctx.add_line(&format!(
        "Unknown component: {}",
        escape_html(&node.component_type)
    ));
    render_children(node, &path, ctx);
    ctx.dedent();
    ctx.add_line("</div>");
}

fn render_children<'a>(node: &'a Node, path: &Path, ctx: &mut Context<'a>) {
    for (index, child) in node.children().iter().enumerate() {
        render_node(child, path.child(index), ctx);
    }
}

/// `<tr><td ...>children</td></tr>`
fn render_table_cell<'a>(
    node: &'a Node,
    path: &Path,
    cell_attrs: Vec<(&str, String)>,
    ctx: &mut Context<'a>,
) {
    ctx.indent();
    ctx.add_line("<tr>");
    ctx.indent();
    ctx.add_line(&format!("<td{}>", attrs(&cell_attrs)));
    ctx.indent();
    render_children(node, path, ctx);
    ctx.dedent();
    ctx.add_line("</td>");
    ctx.dedent();
    ctx.add_line("</tr>");
    ctx.dedent();
}

/// Ordered list of CSS declarations; later `set` calls replace in place
struct StyleList {
    declarations: Vec<(String, String)>,
}

impl StyleList {
    fn new() -> Self {
        Self {
            declarations: Vec::new(),
        }
    }

    fn set(&mut self, property: impl Into<String>, value: impl Into<String>) {
        let property = property.into();
        let value = value.into();
        match self.declarations.iter_mut().find(|(p, _)| *p == property) {
            Some(existing) => existing.1 = value,
            None => self.declarations.push((property, value)),
        }
    }

    fn to_css(&self) -> String {
        self.declarations
            .iter()
            .map(|(property, value)| format!("{}:{};", property, value))
            .collect()
    }
}

/// Inline the node's `style` prop on top of the component defaults
fn apply_node_style(style: &mut StyleList, node: &Node, path: &Path, ctx: &mut Context<'_>) {
    let Some(entries) = node.style() else {
        return;
    };

    for (key, value) in entries {
        let property = kebab_case(key);
        match value {
            Value::Null => {}
            Value::String(s) => style.set(property, s.clone()),
            Value::Bool(b) => style.set(property, b.to_string()),
            Value::Number(n) => {
                let value = if is_unitless(&property) || n.as_f64() == Some(0.0) {
                    n.to_string()
                } else {
                    format!("{}px", n)
                };
                style.set(property, value);
            }
            Value::Array(_) | Value::Object(_) => ctx.warn(format!(
                "{}: style '{}' on '{}' is not a scalar and was skipped",
                path, key, node.id
            )),
        }
    }
}

fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn is_unitless(property: &str) -> bool {
    matches!(
        property,
        "font-weight" | "line-height" | "opacity" | "z-index" | "flex" | "order"
    )
}

fn prop_str<'n>(node: &'n Node, key: &str) -> Option<&'n str> {
    node.props.get(key).and_then(Value::as_str)
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_content(node: &Node) -> String {
    escape_html(node.content.as_deref().unwrap_or_default()).replace('\n', "<br>")
}

fn table_attrs(extra: Vec<(&str, String)>) -> String {
    let mut all = vec![
        ("role", "presentation".to_string()),
        ("width", "100%".to_string()),
        ("cellpadding", "0".to_string()),
        ("cellspacing", "0".to_string()),
        ("border", "0".to_string()),
    ];
    all.extend(extra);
    attrs(&all)
}

/// ` name="value"` pairs, skipping empty values
fn attrs(pairs: &[(&str, String)]) -> String {
    attrs_keep_empty(pairs, &[])
}

fn attrs_keep_empty(pairs: &[(&str, String)], keep: &[&str]) -> String {
    pairs
        .iter()
        .filter(|(name, value)| !value.is_empty() || keep.contains(name))
        .map(|(name, value)| format!(" {}=\"{}\"", name, escape_html(value)))
        .collect()
}

pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
