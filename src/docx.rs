use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

use crate::error::Error;
use crate::model::{Alignment, Document, Paragraph, Run};

const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const DEFAULT_FONT: &str = "Calibri";

struct LevelDef {
    num_fmt: String,
    lvl_text: String,
    indent_left: f32,
    indent_hanging: f32,
}

#[derive(Default)]
struct NumberingInfo {
    abstract_nums: HashMap<String, HashMap<u8, LevelDef>>,
    num_to_abstract: HashMap<String, String>,
}

struct StyleDefaults {
    font_size: f32,
    font_name: String,
    space_after: f32,
    line_spacing: f32, // multiplier from w:spacing @line / 240
}

#[derive(Default)]
struct ParagraphStyle {
    based_on: Option<String>,
    font_size: Option<f32>,
    font_name: Option<String>,
    bold: Option<bool>,
    italic: Option<bool>,
    color: Option<[u8; 3]>,
    space_before: Option<f32>,
    space_after: Option<f32>,
    line_spacing: Option<f32>,
    alignment: Option<Alignment>,
}

struct StylesInfo {
    defaults: StyleDefaults,
    paragraph_styles: HashMap<String, ParagraphStyle>,
}

/// Paragraph style with the `basedOn` chain folded in.
#[derive(Default)]
struct ResolvedStyle {
    font_size: Option<f32>,
    font_name: Option<String>,
    bold: Option<bool>,
    italic: Option<bool>,
    color: Option<[u8; 3]>,
    space_before: Option<f32>,
    space_after: Option<f32>,
    line_spacing: Option<f32>,
    alignment: Option<Alignment>,
}

impl StylesInfo {
    fn resolve(&self, style_id: Option<&str>) -> ResolvedStyle {
        let mut resolved = ResolvedStyle::default();
        let mut next = style_id
            .or_else(|| self.paragraph_styles.contains_key("Normal").then_some("Normal"));
        // basedOn cycles exist in the wild
        for _ in 0..16 {
            let Some(style) = next.and_then(|id| self.paragraph_styles.get(id)) else {
                break;
            };
            resolved.font_size = resolved.font_size.or(style.font_size);
            resolved.font_name = resolved.font_name.or_else(|| style.font_name.clone());
            resolved.bold = resolved.bold.or(style.bold);
            resolved.italic = resolved.italic.or(style.italic);
            resolved.color = resolved.color.or(style.color);
            resolved.space_before = resolved.space_before.or(style.space_before);
            resolved.space_after = resolved.space_after.or(style.space_after);
            resolved.line_spacing = resolved.line_spacing.or(style.line_spacing);
            resolved.alignment = resolved.alignment.or(style.alignment);
            next = style.based_on.as_deref();
        }
        resolved
    }
}

fn twips_to_pts(twips: f32) -> f32 {
    twips / 20.0
}

fn parse_hex_color(val: &str) -> Option<[u8; 3]> {
    // Byte slicing below needs six ASCII hex digits
    if val.len() != 6 || !val.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&val[0..2], 16).ok()?;
    let g = u8::from_str_radix(&val[2..4], 16).ok()?;
    let b = u8::from_str_radix(&val[4..6], 16).ok()?;
    Some([r, g, b])
}

fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children().find(|n| is_wml(*n, name))
}

fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

fn twips_attr(node: roxmltree::Node, attr: &str) -> Option<f32> {
    node.attribute((WML_NS, attr))
        .and_then(|v| v.parse::<f32>().ok())
        .map(twips_to_pts)
}

/// OOXML on/off property: `<w:b/>` is on, `<w:b w:val="0"/>` is off.
fn on_off(node: roxmltree::Node, name: &str) -> Option<bool> {
    let prop = wml(node, name)?;
    Some(!matches!(
        prop.attribute((WML_NS, "val")),
        Some("0" | "false" | "off")
    ))
}

fn half_points(rpr: roxmltree::Node) -> Option<f32> {
    wml_attr(rpr, "sz")
        .and_then(|v| v.parse::<f32>().ok())
        .map(|hp| hp / 2.0)
}

fn font_family(rpr: roxmltree::Node) -> Option<String> {
    let rfonts = wml(rpr, "rFonts")?;
    rfonts
        .attribute((WML_NS, "ascii"))
        .or_else(|| rfonts.attribute((WML_NS, "hAnsi")))
        .map(str::to_string)
}

/// Auto line spacing (`w:line` / 240); exact and at-least rules are ignored.
fn line_spacing(spacing: roxmltree::Node) -> Option<f32> {
    match spacing.attribute((WML_NS, "lineRule")) {
        None | Some("auto") => spacing
            .attribute((WML_NS, "line"))
            .and_then(|v| v.parse::<f32>().ok())
            .map(|line| line / 240.0),
        Some(_) => None,
    }
}

fn parse_alignment(val: &str) -> Alignment {
    match val {
        "center" => Alignment::Center,
        "right" | "end" => Alignment::Right,
        "both" | "distribute" => Alignment::Justify,
        _ => Alignment::Left,
    }
}

fn read_part<R: Read + Seek>(zip: &mut zip::ZipArchive<R>, name: &str) -> Option<String> {
    let mut file = zip.by_name(name).ok()?;
    let mut content = String::new();
    match file.read_to_string(&mut content) {
        Ok(_) => Some(content),
        Err(e) => {
            log::warn!("Skipping unreadable part {name}: {e}");
            None
        }
    }
}

fn parse_styles<R: Read + Seek>(zip: &mut zip::ZipArchive<R>) -> StylesInfo {
    let mut defaults = StyleDefaults {
        font_size: 11.0,
        font_name: DEFAULT_FONT.to_string(),
        space_after: 0.0,
        line_spacing: 1.0,
    };
    let mut paragraph_styles = HashMap::new();

    let Some(xml_content) = read_part(zip, "word/styles.xml") else {
        return StylesInfo { defaults, paragraph_styles };
    };
    let xml = match roxmltree::Document::parse(&xml_content) {
        Ok(xml) => xml,
        Err(e) => {
            log::warn!("Ignoring malformed word/styles.xml: {e}");
            return StylesInfo { defaults, paragraph_styles };
        }
    };

    let root = xml.root_element();

    if let Some(doc_defaults) = wml(root, "docDefaults") {
        if let Some(rpr) = wml(doc_defaults, "rPrDefault").and_then(|n| wml(n, "rPr")) {
            if let Some(size) = half_points(rpr) {
                defaults.font_size = size;
            }
            if let Some(name) = font_family(rpr) {
                defaults.font_name = name;
            }
        }
        let default_spacing = wml(doc_defaults, "pPrDefault")
            .and_then(|n| wml(n, "pPr"))
            .and_then(|n| wml(n, "spacing"));
        if let Some(spacing) = default_spacing {
            if let Some(after) = twips_attr(spacing, "after") {
                defaults.space_after = after;
            }
            if let Some(factor) = line_spacing(spacing) {
                defaults.line_spacing = factor;
            }
        }
    }

    for style_node in root.children().filter(|n| is_wml(*n, "style")) {
        if style_node.attribute((WML_NS, "type")) != Some("paragraph") {
            continue;
        }
        let Some(style_id) = style_node.attribute((WML_NS, "styleId")) else {
            continue;
        };

        let ppr = wml(style_node, "pPr");
        let spacing = ppr.and_then(|n| wml(n, "spacing"));
        let rpr = wml(style_node, "rPr");

        paragraph_styles.insert(
            style_id.to_string(),
            ParagraphStyle {
                based_on: wml_attr(style_node, "basedOn").map(str::to_string),
                font_size: rpr.and_then(half_points),
                font_name: rpr.and_then(font_family),
                bold: rpr.and_then(|n| on_off(n, "b")),
                italic: rpr.and_then(|n| on_off(n, "i")),
                color: rpr
                    .and_then(|n| wml_attr(n, "color"))
                    .and_then(parse_hex_color),
                space_before: spacing.and_then(|n| twips_attr(n, "before")),
                space_after: spacing.and_then(|n| twips_attr(n, "after")),
                line_spacing: spacing.and_then(line_spacing),
                alignment: ppr.and_then(|n| wml_attr(n, "jc")).map(parse_alignment),
            },
        );
    }

    StylesInfo { defaults, paragraph_styles }
}

fn parse_numbering<R: Read + Seek>(zip: &mut zip::ZipArchive<R>) -> NumberingInfo {
    let mut numbering = NumberingInfo::default();

    let Some(xml_content) = read_part(zip, "word/numbering.xml") else {
        return numbering;
    };
    let xml = match roxmltree::Document::parse(&xml_content) {
        Ok(xml) => xml,
        Err(e) => {
            log::warn!("Ignoring malformed word/numbering.xml: {e}");
            return numbering;
        }
    };

    for node in xml.root_element().children() {
        if is_wml(node, "abstractNum") {
            let Some(abs_id) = node.attribute((WML_NS, "abstractNumId")) else {
                continue;
            };
            let mut levels = HashMap::new();
            for lvl in node.children().filter(|n| is_wml(*n, "lvl")) {
                let Some(ilvl) = lvl
                    .attribute((WML_NS, "ilvl"))
                    .and_then(|v| v.parse::<u8>().ok())
                else {
                    continue;
                };
                let ind = wml(lvl, "pPr").and_then(|ppr| wml(ppr, "ind"));
                levels.insert(
                    ilvl,
                    LevelDef {
                        num_fmt: wml_attr(lvl, "numFmt").unwrap_or("bullet").to_string(),
                        lvl_text: wml_attr(lvl, "lvlText").unwrap_or("").to_string(),
                        indent_left: ind.and_then(|n| twips_attr(n, "left")).unwrap_or(0.0),
                        indent_hanging: ind
                            .and_then(|n| twips_attr(n, "hanging"))
                            .unwrap_or(0.0),
                    },
                );
            }
            numbering.abstract_nums.insert(abs_id.to_string(), levels);
        } else if is_wml(node, "num") {
            let (Some(num_id), Some(abs_id)) = (
                node.attribute((WML_NS, "numId")),
                wml_attr(node, "abstractNumId"),
            ) else {
                continue;
            };
            numbering
                .num_to_abstract
                .insert(num_id.to_string(), abs_id.to_string());
        }
    }

    numbering
}

pub fn parse(path: &Path) -> Result<Document, Error> {
    let file = std::fs::File::open(path)?;
    parse_archive(zip::ZipArchive::new(file)?)
}

fn parse_archive<R: Read + Seek>(mut zip: zip::ZipArchive<R>) -> Result<Document, Error> {
    let styles = parse_styles(&mut zip);
    let numbering = parse_numbering(&mut zip);

    let mut xml_content = String::new();
    match zip.by_name("word/document.xml") {
        Ok(mut part) => {
            part.read_to_string(&mut xml_content)?;
        }
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(Error::InvalidDocx("missing word/document.xml".into()));
        }
        Err(e) => return Err(e.into()),
    }

    let xml = roxmltree::Document::parse(&xml_content)?;
    let body = wml(xml.root_element(), "body")
        .ok_or_else(|| Error::InvalidDocx("missing w:body".into()))?;

    let sect = wml(body, "sectPr");
    let pg_sz = sect.and_then(|s| wml(s, "pgSz"));
    let pg_mar = sect.and_then(|s| wml(s, "pgMar"));

    let mut builder = BodyBuilder {
        styles: &styles,
        numbering: &numbering,
        counters: HashMap::new(),
        paragraphs: Vec::new(),
    };
    builder.collect(body);
    let paragraphs = builder.paragraphs;

    log::debug!("Parsed {} paragraph(s) from word/document.xml", paragraphs.len());

    Ok(Document {
        page_width: pg_sz.and_then(|n| twips_attr(n, "w")).unwrap_or(612.0),
        page_height: pg_sz.and_then(|n| twips_attr(n, "h")).unwrap_or(792.0),
        margin_top: pg_mar.and_then(|n| twips_attr(n, "top")).unwrap_or(72.0),
        margin_bottom: pg_mar.and_then(|n| twips_attr(n, "bottom")).unwrap_or(72.0),
        margin_left: pg_mar.and_then(|n| twips_attr(n, "left")).unwrap_or(72.0),
        margin_right: pg_mar.and_then(|n| twips_attr(n, "right")).unwrap_or(72.0),
        line_spacing: styles.defaults.line_spacing,
        default_font_size: styles.defaults.font_size,
        paragraphs,
    })
}

struct BodyBuilder<'s> {
    styles: &'s StylesInfo,
    numbering: &'s NumberingInfo,
    counters: HashMap<(String, u8), u32>,
    paragraphs: Vec<Paragraph>,
}

impl BodyBuilder<'_> {
    fn collect(&mut self, container: roxmltree::Node) {
        for node in container.children() {
            if is_wml(node, "p") {
                self.paragraph(node);
            } else if is_wml(node, "tbl") {
                self.table(node);
            } else if is_wml(node, "sdt") {
                if let Some(content) = wml(node, "sdtContent") {
                    self.collect(content);
                }
            }
        }
    }

    fn table(&mut self, tbl: roxmltree::Node) {
        let defaults = &self.styles.defaults;
        for row in tbl.children().filter(|n| is_wml(*n, "tr")) {
            let cells: Vec<String> = row
                .children()
                .filter(|n| is_wml(*n, "tc"))
                .map(|cell| {
                    cell.children()
                        .filter(|n| is_wml(*n, "p"))
                        .map(|p| {
                            p.descendants()
                                .filter(|n| is_wml(*n, "t"))
                                .filter_map(|n| n.text())
                                .collect::<String>()
                        })
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect();

            self.paragraphs.push(Paragraph {
                runs: vec![Run {
                    text: cells.join("\t"),
                    font_size: defaults.font_size,
                    font_name: defaults.font_name.clone(),
                    bold: false,
                    italic: false,
                    color: None,
                }],
                space_before: 0.0,
                space_after: 2.0,
                alignment: Alignment::Left,
                indent_left: 0.0,
                indent_hanging: 0.0,
                list_label: String::new(),
                page_break_before: false,
                line_spacing: Some(1.0),
            });
        }
    }

    fn paragraph(&mut self, node: roxmltree::Node) {
        let defaults = &self.styles.defaults;
        let ppr = wml(node, "pPr");
        let style = self.styles.resolve(ppr.and_then(|ppr| wml_attr(ppr, "pStyle")));

        let inline_spacing = ppr.and_then(|ppr| wml(ppr, "spacing"));

        let space_before = inline_spacing
            .and_then(|n| twips_attr(n, "before"))
            .or(style.space_before)
            .unwrap_or(0.0);
        let space_after = inline_spacing
            .and_then(|n| twips_attr(n, "after"))
            .or(style.space_after)
            .unwrap_or(defaults.space_after);
        let line_spacing = inline_spacing.and_then(line_spacing).or(style.line_spacing);

        let alignment = ppr
            .and_then(|ppr| wml_attr(ppr, "jc"))
            .map(parse_alignment)
            .or(style.alignment)
            .unwrap_or(Alignment::Left);

        let num_pr = ppr.and_then(|ppr| wml(ppr, "numPr"));
        let (mut indent_left, mut indent_hanging, list_label) =
            parse_list_info(num_pr, self.numbering, &mut self.counters);

        // Paragraph-level w:ind overrides the level definition
        if let Some(ind) = ppr.and_then(|ppr| wml(ppr, "ind")) {
            if let Some(v) = twips_attr(ind, "left").or_else(|| twips_attr(ind, "start")) {
                indent_left = v;
            }
            if let Some(v) = twips_attr(ind, "hanging") {
                indent_hanging = v;
            }
        }

        let base = Run {
            text: String::new(),
            font_size: style.font_size.unwrap_or(defaults.font_size),
            font_name: style
                .font_name
                .clone()
                .unwrap_or_else(|| defaults.font_name.clone()),
            bold: style.bold.unwrap_or(false),
            italic: style.italic.unwrap_or(false),
            color: style.color,
        };

        // A hard page break splits the paragraph; text after it starts a new page.
        let mut segments: Vec<Vec<Run>> = vec![Vec::new()];
        for run_node in paragraph_runs(node) {
            let rpr = wml(run_node, "rPr");
            let mut run = base.clone();
            if let Some(rpr) = rpr {
                run.font_size = half_points(rpr).unwrap_or(run.font_size);
                run.font_name = font_family(rpr).unwrap_or(run.font_name);
                run.bold = on_off(rpr, "b").unwrap_or(run.bold);
                run.italic = on_off(rpr, "i").unwrap_or(run.italic);
                run.color = wml_attr(rpr, "color")
                    .and_then(parse_hex_color)
                    .or(run.color);
            }

            for child in run_node.children() {
                if !child.is_element() || child.tag_name().namespace() != Some(WML_NS) {
                    continue;
                }
                match child.tag_name().name() {
                    "t" => run.text.push_str(child.text().unwrap_or("")),
                    "tab" => run.text.push('\t'),
                    "cr" => run.text.push('\n'),
                    "noBreakHyphen" => run.text.push('-'),
                    "br" if child.attribute((WML_NS, "type")) == Some("page") => {
                        push_run(&mut segments, std::mem::take(&mut run.text), &run);
                        segments.push(Vec::new());
                    }
                    "br" => run.text.push('\n'),
                    _ => {}
                }
            }
            push_run(&mut segments, std::mem::take(&mut run.text), &run);
        }

        let page_break_before = ppr.and_then(|ppr| on_off(ppr, "pageBreakBefore")) == Some(true);

        for (i, runs) in segments.into_iter().enumerate() {
            self.paragraphs.push(Paragraph {
                runs,
                space_before: if i == 0 { space_before } else { 0.0 },
                space_after,
                alignment,
                indent_left,
                indent_hanging: if i == 0 { indent_hanging } else { 0.0 },
                list_label: if i == 0 { list_label.clone() } else { String::new() },
                page_break_before: if i == 0 { page_break_before } else { true },
                line_spacing,
            });
        }
    }
}

fn push_run(segments: &mut [Vec<Run>], text: String, template: &Run) {
    if text.is_empty() {
        return;
    }
    if let Some(current) = segments.last_mut() {
        current.push(Run {
            text,
            ..template.clone()
        });
    }
}

/// Runs of a paragraph, including those wrapped in hyperlinks, insertions and smart tags.
fn paragraph_runs<'a>(para: roxmltree::Node<'a, 'a>) -> Vec<roxmltree::Node<'a, 'a>> {
    let mut runs = Vec::new();
    for child in para.children() {
        if is_wml(child, "r") {
            runs.push(child);
        } else if ["hyperlink", "ins", "smartTag", "fldSimple"]
            .iter()
            .any(|name| is_wml(child, name))
        {
            runs.extend(paragraph_runs(child));
        }
    }
    runs
}

fn parse_list_info(
    num_pr: Option<roxmltree::Node>,
    numbering: &NumberingInfo,
    counters: &mut HashMap<(String, u8), u32>,
) -> (f32, f32, String) {
    let Some(num_pr) = num_pr else {
        return (0.0, 0.0, String::new());
    };
    let Some(num_id) = wml_attr(num_pr, "numId") else {
        return (0.0, 0.0, String::new());
    };
    let ilvl = wml_attr(num_pr, "ilvl")
        .and_then(|v| v.parse::<u8>().ok())
        .unwrap_or(0);

    let Some(def) = numbering
        .num_to_abstract
        .get(num_id)
        .and_then(|abs_id| numbering.abstract_nums.get(abs_id))
        .and_then(|levels| levels.get(&ilvl))
    else {
        return (0.0, 0.0, String::new());
    };

    // Deeper levels restart whenever a shallower item appears.
    counters.retain(|(id, lvl), _| id != num_id || *lvl <= ilvl);
    let counter = counters
        .entry((num_id.to_string(), ilvl))
        .and_modify(|c| *c += 1)
        .or_insert(1);

    let label = match def.num_fmt.as_str() {
        "bullet" => "\u{2022}".to_string(),
        "none" => String::new(),
        _ => {
            let mut label = def.lvl_text.clone();
            for level in 0..=ilvl {
                let value = counters
                    .get(&(num_id.to_string(), level))
                    .copied()
                    .unwrap_or(1);
                label = label.replace(&format!("%{}", level + 1), &value.to_string());
            }
            label
        }
    };
    (def.indent_left, def.indent_hanging, label)
}
