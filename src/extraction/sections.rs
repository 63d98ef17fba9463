//! 章节抽取器
//!
//! 每个抽取器都是 `(document) -> CaseRecord` 的纯函数，互相独立、不分先后，
//! 可以单独对着手工构造的 HTML 片段做单元测试。锚点缺失时返回对应形态的空值。
//!
//! 三类模式：
//! - 标签锚定键值：按 `<label>` 文本定位，取所在行的冒号后半段；
//!   成对出现的字段（编号+日期）先用更严格的成对正则，不中再整行兜底
//! - 类名锚定整块：按容器 class 定位，拍平全部文本
//! - 表格：表头定列数，列数不符的行直接丢弃

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::models::{CaseRecord, CaseTable};

static LABEL: Lazy<Selector> = Lazy::new(|| Selector::parse("label").expect("合法选择器"));
static STRONG: Lazy<Selector> = Lazy::new(|| Selector::parse("strong").expect("合法选择器"));
static SPAN: Lazy<Selector> = Lazy::new(|| Selector::parse("span").expect("合法选择器"));
static DIV: Lazy<Selector> = Lazy::new(|| Selector::parse("div").expect("合法选择器"));
static H2: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").expect("合法选择器"));
static TH: Lazy<Selector> = Lazy::new(|| Selector::parse("th").expect("合法选择器"));
static TD: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("合法选择器"));
static TR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("合法选择器"));

static PETITIONER_SPAN: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.Petitioner_Advocate_table").expect("合法选择器"));
static RESPONDENT_SPAN: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.Respondent_Advocate_table").expect("合法选择器"));
static ACTS_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.Acts_table").expect("合法选择器"));
static LOWER_COURT_SPAN: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.Lower_court_table").expect("合法选择器"));
static FIR_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.FIR_details_table").expect("合法选择器"));
static FIR_SPAN: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.FIR_details_table").expect("合法选择器"));
static IA_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.IAheading").expect("合法选择器"));
static ORDER_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.order_table").expect("合法选择器"));

static FILING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Filing\s+Number\s*:\s*(.*?)\s*Filing\s+Date\s*:\s*(.*)").expect("合法正则")
});
static REGISTRATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Registration\s+Number\s*:\s*(.*?)\s*Registration\s+Date\s*:\s*(.*)")
        .expect("合法正则")
});

/// 案件详情：Case Type / Filing / Registration / CNR
pub(crate) fn case_details(document: &Html) -> CaseRecord {
    let mut entries: Vec<(String, CaseRecord)> = Vec::new();

    if let Some(value) = labeled_row_value(document, "Case Type") {
        entries.push(("Case Type".to_string(), CaseRecord::Scalar(value)));
    }

    paired_row(
        document,
        "Filing Number",
        &FILING_RE,
        ("Filing Number", "Filing Date"),
        "Filing Details",
        &mut entries,
    );
    paired_row(
        document,
        "Registration Number",
        &REGISTRATION_RE,
        ("Registration Number", "Registration Date"),
        "Registration Details",
        &mut entries,
    );

    if let Some(value) = labeled_row_value(document, "CNR Number") {
        entries.push(("CNR Number".to_string(), CaseRecord::Scalar(value)));
    }

    CaseRecord::Mapping(entries)
}

/// 案件状态：高亮底色区块里的 双 strong 键值对
pub(crate) fn case_status(document: &Html) -> CaseRecord {
    let mut entries: Vec<(String, CaseRecord)> = Vec::new();

    if let Some(status_div) = document
        .select(&DIV)
        .find(|el| style_contains(*el, "background-color:#FBF6D9"))
    {
        for label in status_div.select(&LABEL) {
            let strongs: Vec<ElementRef<'_>> = label.select(&STRONG).collect();
            if strongs.len() >= 2 {
                let key = flatten_text(strongs[0], " ");
                let value = strip_leading_colon(&flatten_text(strongs[1], " "));
                if !key.is_empty() {
                    entries.push((key, CaseRecord::Scalar(value)));
                }
            }
        }
    }

    CaseRecord::Mapping(entries)
}

/// 上诉人及律师（自由文本，按行拍平）
pub(crate) fn petitioner_advocate(document: &Html) -> CaseRecord {
    class_anchored_text(document, &PETITIONER_SPAN)
}

/// 被上诉人及律师
pub(crate) fn respondent_advocate(document: &Html) -> CaseRecord {
    class_anchored_text(document, &RESPONDENT_SPAN)
}

/// 适用法条表格
pub(crate) fn acts(document: &Html) -> CaseRecord {
    table_with_th_headers(document, &ACTS_TABLE)
}

/// 下级法院信息：固定宽度标签 + 紧随其后的 label 值
pub(crate) fn subordinate_court(document: &Html) -> CaseRecord {
    match document.select(&LOWER_COURT_SPAN).next() {
        Some(container) => CaseRecord::Mapping(
            fixed_width_pairs(container)
                .into_iter()
                .map(|(key, value)| (key, CaseRecord::Scalar(value)))
                .collect(),
        ),
        None => CaseRecord::empty_mapping(),
    }
}

/// FIR 详情：优先表格形式（th 表头，没有则用首行 td 兜底），
/// 部分高等法院用 span 键值对形式，转成单行表格
pub(crate) fn fir_details(document: &Html) -> CaseRecord {
    if let Some(table) = document.select(&FIR_TABLE).next() {
        let mut headers: Vec<String> = table
            .select(&TH)
            .map(|th| flatten_text(th, " "))
            .collect();
        let rows: Vec<ElementRef<'_>> = table.select(&TR).collect();

        if headers.is_empty() {
            if let Some(first_row) = rows.first() {
                headers = first_row
                    .select(&TD)
                    .map(|td| flatten_text(td, " "))
                    .collect();
            }
        }
        if headers.is_empty() {
            return CaseRecord::Table(CaseTable::default());
        }

        let mut out = CaseTable::new(headers);
        for row in rows.iter().skip(1) {
            let cells: Vec<String> = row.select(&TD).map(|td| flatten_text(td, " ")).collect();
            out.push_row(cells);
        }
        return CaseRecord::Table(out);
    }

    if let Some(container) = document.select(&FIR_SPAN).next() {
        let pairs = fixed_width_pairs(container);
        if !pairs.is_empty() {
            let (headers, row): (Vec<String>, Vec<String>) = pairs.into_iter().unzip();
            let mut out = CaseTable::new(headers);
            out.push_row(row);
            return CaseRecord::Table(out);
        }
    }

    CaseRecord::Table(CaseTable::default())
}

/// 中间申请（IA）表格
pub(crate) fn ia_details(document: &Html) -> CaseRecord {
    table_with_th_headers(document, &IA_TABLE)
}

/// 命令/判决表格：没有 th，表头取第一行的 td
pub(crate) fn orders(document: &Html) -> CaseRecord {
    let Some(table) = document.select(&ORDER_TABLE).next() else {
        return CaseRecord::Table(CaseTable::default());
    };
    let Some(header_row) = table.select(&TR).next() else {
        return CaseRecord::Table(CaseTable::default());
    };

    let headers: Vec<String> = header_row
        .select(&TD)
        .map(|td| flatten_text(td, " "))
        .collect();
    if headers.is_empty() {
        return CaseRecord::Table(CaseTable::default());
    }

    let mut out = CaseTable::new(headers);
    for row in table.select(&TR).skip(1) {
        let cells: Vec<String> = row.select(&TD).map(|td| flatten_text(td, " ")).collect();
        out.push_row(cells);
    }
    CaseRecord::Table(out)
}

/// 案件类别：以 "Category Details" 标题为锚，取标题所在表格的下一个兄弟表格
pub(crate) fn category_details(document: &Html) -> CaseRecord {
    let mut entries: Vec<(String, CaseRecord)> = Vec::new();

    let heading = document
        .select(&H2)
        .find(|el| flatten_text(*el, " ").contains("Category Details"));

    if let Some(heading) = heading {
        let header_table = heading
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "table");
        let data_table = header_table.and_then(|table| {
            table
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "table")
        });

        if let Some(data_table) = data_table {
            for row in data_table.select(&TR) {
                let cells: Vec<String> =
                    row.select(&TD).map(|td| flatten_text(td, " ")).collect();
                if cells.len() >= 2 {
                    entries.push((cells[0].clone(), CaseRecord::Scalar(cells[1].clone())));
                }
            }
        }
    }

    CaseRecord::Mapping(entries)
}

// ========== 共用辅助 ==========

/// 拍平元素的全部文本节点：去 nbsp、逐段 trim、丢空段、按分隔符拼接
fn flatten_text(el: ElementRef<'_>, separator: &str) -> String {
    let parts: Vec<String> = el
        .text()
        .map(|t| t.replace('\u{a0}', " ").trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    parts.join(separator)
}

fn strip_leading_colon(text: &str) -> String {
    text.trim_start_matches(':').trim().to_string()
}

fn style_contains(el: ElementRef<'_>, needle: &str) -> bool {
    el.value().attr("style").map_or(false, |s| s.contains(needle))
}

fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value()
        .attr("class")
        .map_or(false, |c| c.split_whitespace().any(|name| name == class))
}

/// 找到文本包含指定短语的第一个 label
fn find_label_with_text<'a>(document: &'a Html, phrase: &str) -> Option<ElementRef<'a>> {
    document
        .select(&LABEL)
        .find(|el| flatten_text(*el, " ").contains(phrase))
}

/// 向上找带指定 class 的祖先容器
fn ancestor_with_class<'a>(el: ElementRef<'a>, class: &str) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| has_class(*ancestor, class))
}

/// 标签锚定键值：label → 所在行容器 → 整行文本冒号后半段
fn labeled_row_value(document: &Html, phrase: &str) -> Option<String> {
    let label = find_label_with_text(document, phrase)?;
    let row = ancestor_with_class(label, "case_details_table")?;
    let text = flatten_text(row, " ");
    text.split_once(':')
        .map(|(_, value)| value.trim().to_string())
}

/// 成对字段：先试成对正则（编号+日期），不中再把整行存到兜底键下
fn paired_row(
    document: &Html,
    phrase: &str,
    pattern: &Regex,
    keys: (&str, &str),
    fallback_key: &str,
    entries: &mut Vec<(String, CaseRecord)>,
) {
    let Some(label) = find_label_with_text(document, phrase) else {
        return;
    };
    let Some(row) = ancestor_with_class(label, "case_details_table") else {
        return;
    };

    let text = flatten_text(row, " ");
    if let Some(caps) = pattern.captures(&text) {
        entries.push((keys.0.to_string(), CaseRecord::scalar(caps[1].trim())));
        entries.push((keys.1.to_string(), CaseRecord::scalar(caps[2].trim())));
    } else {
        entries.push((fallback_key.to_string(), CaseRecord::Scalar(text)));
    }
}

/// 类名锚定整块文本（按行拼接）
fn class_anchored_text(document: &Html, selector: &Selector) -> CaseRecord {
    match document.select(selector).next() {
        Some(el) => CaseRecord::Scalar(flatten_text(el, "\n")),
        None => CaseRecord::Scalar(String::new()),
    }
}

/// th 表头的标准表格：首行之后、列数等于表头数的行才收录
fn table_with_th_headers(document: &Html, selector: &Selector) -> CaseRecord {
    let Some(table) = document.select(selector).next() else {
        return CaseRecord::Table(CaseTable::default());
    };

    let headers: Vec<String> = table.select(&TH).map(|th| flatten_text(th, " ")).collect();
    if headers.is_empty() {
        return CaseRecord::Table(CaseTable::default());
    }

    let mut out = CaseTable::new(headers);
    for row in table.select(&TR).skip(1) {
        let cells: Vec<String> = row.select(&TD).map(|td| flatten_text(td, " ")).collect();
        out.push_row(cells);
    }
    CaseRecord::Table(out)
}

/// 复合键值列表：固定宽度（width:150px）的 span 标签 + 结构上紧随其后的 label 值
fn fixed_width_pairs(container: ElementRef<'_>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for key_span in container
        .select(&SPAN)
        .filter(|el| style_contains(*el, "width:150px"))
    {
        let key = flatten_text(key_span, " ");
        if key.is_empty() {
            continue;
        }
        let Some(value_label) = key_span
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|sibling| sibling.value().name() == "label")
        else {
            continue;
        };
        pairs.push((key, strip_leading_colon(&flatten_text(value_label, " "))));
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn test_case_details_colon_split() {
        let document = parse(
            r#"<span class="case_details_table"><label>Case Type</label> : Cr.A(SJ) - CRIMINAL APPEAL</span>"#,
        );
        let record = case_details(&document);

        assert_eq!(
            record.get("Case Type"),
            Some(&CaseRecord::scalar("Cr.A(SJ) - CRIMINAL APPEAL"))
        );
    }

    #[test]
    fn test_case_details_paired_pattern() {
        let document = parse(
            r#"<span class="case_details_table"><label>Filing Number</label> : 1234/2021
               <label>Filing Date</label> : 15-03-2021</span>"#,
        );
        let record = case_details(&document);

        assert_eq!(
            record.get("Filing Number"),
            Some(&CaseRecord::scalar("1234/2021"))
        );
        assert_eq!(
            record.get("Filing Date"),
            Some(&CaseRecord::scalar("15-03-2021"))
        );
        assert_eq!(record.get("Filing Details"), None);
    }

    #[test]
    fn test_case_details_paired_pattern_falls_back_to_whole_text() {
        let document = parse(
            r#"<span class="case_details_table"><label>Filing Number</label> : 1234/2021</span>"#,
        );
        let record = case_details(&document);

        assert_eq!(record.get("Filing Number"), None);
        assert_eq!(
            record.get("Filing Details"),
            Some(&CaseRecord::scalar("Filing Number : 1234/2021"))
        );
    }

    #[test]
    fn test_case_status_double_strong_pairs() {
        let document = parse(
            r#"<div style="background-color:#FBF6D9">
                <label><strong>Case Status</strong><strong>: Pending</strong></label>
                <label><strong>Next Hearing</strong><strong>: 10-09-2025</strong></label>
            </div>"#,
        );
        let record = case_status(&document);

        assert_eq!(
            record.get("Case Status"),
            Some(&CaseRecord::scalar("Pending"))
        );
        assert_eq!(
            record.get("Next Hearing"),
            Some(&CaseRecord::scalar("10-09-2025"))
        );
    }

    #[test]
    fn test_petitioner_block_joins_lines() {
        let document = parse(
            r#"<span class="Petitioner_Advocate_table">1) RAMESH KUMAR<br>Advocate - SHRI A. SHARMA</span>"#,
        );
        let record = petitioner_advocate(&document);

        assert_eq!(
            record,
            CaseRecord::scalar("1) RAMESH KUMAR\nAdvocate - SHRI A. SHARMA")
        );
    }

    #[test]
    fn test_table_short_rows_are_dropped() {
        let document = parse(
            r#"<table class="Acts_table">
                <tr><th>A</th><th>B</th></tr>
                <tr><td>1</td><td>2</td></tr>
                <tr><td>3</td></tr>
            </table>"#,
        );
        let CaseRecord::Table(table) = acts(&document) else {
            panic!("Acts 必须是表格");
        };

        assert_eq!(table.headers(), ["A", "B"]);
        assert_eq!(table.rows().len(), 1);
        assert_eq!(table.rows()[0], vec!["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_orders_headers_from_first_row() {
        let document = parse(
            r#"<table class="order_table">
                <tr><td>Order Number</td><td>Order Date</td><td>Order Details</td></tr>
                <tr><td>1</td><td>02-01-2023</td><td>Notice issued</td></tr>
            </table>"#,
        );
        let CaseRecord::Table(table) = orders(&document) else {
            panic!("Orders 必须是表格");
        };

        assert_eq!(table.headers(), ["Order Number", "Order Date", "Order Details"]);
        assert_eq!(table.rows().len(), 1);
    }

    #[test]
    fn test_fir_table_header_fallback_to_first_row() {
        let document = parse(
            r#"<table class="FIR_details_table">
                <tr><td>Police Station</td><td>FIR Number</td></tr>
                <tr><td>Kotwali</td><td>123/2020</td></tr>
            </table>"#,
        );
        let CaseRecord::Table(table) = fir_details(&document) else {
            panic!("FIR 必须是表格");
        };

        assert_eq!(table.headers(), ["Police Station", "FIR Number"]);
        assert_eq!(
            table.rows(),
            [vec!["Kotwali".to_string(), "123/2020".to_string()]]
        );
    }

    #[test]
    fn test_fir_span_form_becomes_single_row_table() {
        let document = parse(
            r#"<span class="FIR_details_table">
                <span style="display:inline-block;width:150px">Police Station</span><label>: Kotwali</label>
                <span style="display:inline-block;width:150px">FIR Number</span><label>: 123/2020</label>
            </span>"#,
        );
        let CaseRecord::Table(table) = fir_details(&document) else {
            panic!("FIR 必须是表格");
        };

        assert_eq!(table.headers(), ["Police Station", "FIR Number"]);
        assert_eq!(
            table.rows(),
            [vec!["Kotwali".to_string(), "123/2020".to_string()]]
        );
    }

    #[test]
    fn test_subordinate_court_pairs() {
        let document = parse(
            r#"<span class="Lower_court_table">
                <span style="width:150px">Court Number and Name</span><label>: 1, District Court</label>
                <span style="width:150px">Case Number</span><label>: 45/2019</label>
            </span>"#,
        );
        let record = subordinate_court(&document);

        assert_eq!(
            record.get("Court Number and Name"),
            Some(&CaseRecord::scalar("1, District Court"))
        );
        assert_eq!(record.get("Case Number"), Some(&CaseRecord::scalar("45/2019")));
    }

    #[test]
    fn test_category_details_sibling_table() {
        let document = parse(
            r#"<table><tr><td><h2>Category Details</h2></td></tr></table>
               <table><tr><td>Category</td><td>Criminal</td></tr>
                      <tr><td>Sub Category</td><td>Appeal</td></tr></table>"#,
        );
        let record = category_details(&document);

        assert_eq!(record.get("Category"), Some(&CaseRecord::scalar("Criminal")));
        assert_eq!(record.get("Sub Category"), Some(&CaseRecord::scalar("Appeal")));
    }

    #[test]
    fn test_missing_anchors_yield_empty_values() {
        let document = parse("<p>unrelated page</p>");

        assert!(case_details(&document).is_empty());
        assert!(case_status(&document).is_empty());
        assert!(petitioner_advocate(&document).is_empty());
        assert!(acts(&document).is_empty());
        assert!(subordinate_court(&document).is_empty());
        assert!(fir_details(&document).is_empty());
        assert!(ia_details(&document).is_empty());
        assert!(orders(&document).is_empty());
        assert!(category_details(&document).is_empty());
    }
}
