//! `hp:tbl` decoding.

use super::attrs::Attrs;
use super::scanner::{TagSpan, direct_child, direct_children};
use super::section::SectionDecoder;
use super::shape::child_margins;
use crate::model::{Cell, Element, Table, TableGrid, VerticalAlign};

fn child_attrs(inner: &str, tag: &str) -> Attrs {
    direct_child(inner, tag)
        .map(|span| Attrs::parse(span.open_tag(inner)))
        .unwrap_or_default()
}

impl SectionDecoder<'_> {
    /// Decode a table; cells are placed on a [`TableGrid`] so spans and
    /// coverage follow the same rules as legacy tables.
    pub(crate) fn decode_table(&mut self, xml: &str, span: &TagSpan) -> Element {
        let inner = span.inner(xml);
        let attrs = Attrs::parse(span.open_tag(xml));
        let rows = attrs.u32("rowCnt").unwrap_or(0);
        let cols = attrs.u32("colCnt").unwrap_or(0);
        let border_fill_id = attrs.u32("borderFillIDRef");
        let object = self.object_props(inner, &attrs);

        let mut grid = TableGrid::new(rows, cols);
        for tr in direct_children(inner, "hp:tr") {
            let row = tr.inner(inner);
            for tc in direct_children(row, "hp:tc") {
                if grid.is_full() {
                    tracing::debug!("cell beyond the table grid ignored");
                    break;
                }
                let (address, cell) = self.decode_cell(row, &tc);
                grid.place(address, cell);
            }
        }

        Element::Table(Box::new(Table {
            object,
            row_count: grid.rows(),
            col_count: grid.cols(),
            cell_spacing: attrs.u32("cellSpacing").unwrap_or(0),
            inner_margins: child_margins(inner, "hp:inMargin"),
            repeat_header: attrs.flag("repeatHeader"),
            border_fill_id,
            border_fill: border_fill_id
                .and_then(|id| self.styles.border_fill(id))
                .cloned(),
            rows: grid.finish(),
        }))
    }

    fn decode_cell(&mut self, xml: &str, span: &TagSpan) -> (Option<(u32, u32)>, Cell) {
        let inner = span.inner(xml);
        let attrs = Attrs::parse(span.open_tag(xml));
        let addr = child_attrs(inner, "hp:cellAddr");
        let spans = child_attrs(inner, "hp:cellSpan");
        let size = child_attrs(inner, "hp:cellSz");
        let address = addr.u32("rowAddr").zip(addr.u32("colAddr"));
        let vertical_align = direct_child(inner, "hp:subList")
            .and_then(|list| Attrs::parse(list.open_tag(inner)).string("vertAlign"))
            .map_or(VerticalAlign::Top, |name| VerticalAlign::from_hwpx_name(&name));
        let border_fill_id = attrs.u32("borderFillIDRef");

        let cell = Cell {
            row_span: spans.u32("rowSpan").unwrap_or(1),
            col_span: spans.u32("colSpan").unwrap_or(1),
            width: size.u32("width").unwrap_or(0),
            height: size.u32("height").unwrap_or(0),
            margins: child_margins(inner, "hp:cellMargin"),
            vertical_align,
            header: attrs.flag("header"),
            border_fill_id,
            border_fill: border_fill_id
                .and_then(|id| self.styles.border_fill(id))
                .cloned(),
            elements: self.decode_sub_list(inner),
            ..Default::default()
        };
        (address, cell)
    }
}

#[cfg(test)]
mod tests {
    use super::super::header::parse_header;
    use super::super::section::decode_section;
    use super::super::test_support::*;
    use crate::model::{Element, Section, Table, VerticalAlign};

    fn cell(row: u32, col: u32, row_span: u32, col_span: u32, body: &str) -> String {
        format!(
            concat!(
                r#"<hp:tc name="" header="{}" borderFillIDRef="1"><hp:subList vertAlign="CENTER">{}</hp:subList>"#,
                r#"<hp:cellAddr colAddr="{}" rowAddr="{}"/><hp:cellSpan colSpan="{}" rowSpan="{}"/>"#,
                r#"<hp:cellSz width="1000" height="500"/><hp:cellMargin left="10" right="10" top="5" bottom="5"/></hp:tc>"#,
            ),
            u8::from(row == 0),
            body,
            col,
            row,
            col_span,
            row_span
        )
    }

    fn table(rows: u32, cols: u32, trs: &[Vec<String>]) -> String {
        let body: String = trs
            .iter()
            .map(|tr| format!("<hp:tr>{}</hp:tr>", tr.concat()))
            .collect();
        format!(
            r#"<hp:tbl id="9" rowCnt="{}" colCnt="{}" cellSpacing="0" borderFillIDRef="1" repeatHeader="1"><hp:sz width="2000" height="1000"/><hp:pos treatAsChar="0"/><hp:inMargin left="1" right="2" top="3" bottom="4"/>{}</hp:tbl>"#,
            rows, cols, body
        )
    }

    fn decode(body: &str) -> Section {
        let styles = parse_header(HEADER_XML);
        decode_section(&section_xml(body), 0, &styles, true).0
    }

    fn only_table(section: &Section) -> &Table {
        section
            .elements
            .iter()
            .find_map(Element::as_table)
            .expect("a table")
    }

    #[test]
    fn test_column_span() {
        let xml = table(
            2,
            2,
            &[
                vec![cell(0, 0, 1, 2, &para("wide"))],
                vec![cell(1, 0, 1, 1, &para("a")), cell(1, 1, 1, 1, &para("b"))],
            ],
        );
        let section = decode(&para_with(&format!("{}<hp:t/>", xml)));
        let t = only_table(&section);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0].cells.len(), 1);
        assert_eq!(t.rows[0].cells[0].col_span, 2);
        assert_eq!(t.rows[1].cells.len(), 2);
        assert!(t.is_coverage_consistent());
        assert_eq!(t.text(), "wide\na\tb");
        assert!(t.repeat_header);
        assert!(t.border_fill.is_some());
        assert_eq!(t.inner_margins.bottom, 4);
        assert_eq!(t.object.width, 2000);

        let first = &t.rows[0].cells[0];
        assert!(first.header);
        assert_eq!(first.vertical_align, VerticalAlign::Center);
        assert_eq!(first.margins.top, 5);
        assert_eq!(first.width, 1000);
    }

    #[test]
    fn test_nested_table_and_empty_cell() {
        let inner = table(1, 1, &[vec![cell(0, 0, 1, 1, &para("안쪽"))]]);
        let outer = table(
            1,
            2,
            &[vec![
                cell(0, 0, 1, 1, &para_with(&format!("{}<hp:t/>", inner))),
                cell(0, 1, 1, 1, ""),
            ]],
        );
        let section = decode(&format!("{}{}", para_with(&format!("{}<hp:t/>", outer)), para("뒤")));
        let kinds: Vec<_> = section.elements.iter().map(Element::kind).collect();
        assert_eq!(kinds, ["table", "paragraph"]);

        let t = only_table(&section);
        let nested = t.rows[0].cells[0]
            .elements
            .iter()
            .find_map(Element::as_table)
            .unwrap();
        assert_eq!(nested.rows[0].cells[0].text(), "안쪽");
        // the empty cell still holds one paragraph
        assert_eq!(t.rows[0].cells[1].elements.len(), 1);
        assert_eq!(t.rows[0].cells[1].text(), "");
        // cell paragraphs are not top-level paragraphs
        assert_eq!(section.elements[1].as_paragraph().unwrap().source_index, Some(1));
    }

    #[test]
    fn test_cells_past_grid_dropped() {
        let xml = table(
            1,
            1,
            &[vec![cell(0, 0, 1, 1, &para("a")), cell(5, 5, 1, 1, &para("b"))]],
        );
        let section = decode(&para_with(&format!("{}<hp:t/>", xml)));
        let t = only_table(&section);
        assert_eq!(t.cells().count(), 1);
        assert_eq!(t.text(), "a");
    }

    #[test]
    fn test_oversized_dimensions_clamped() {
        let xml = table(
            u32::MAX,
            2,
            &[vec![cell(0, 0, 1, 1, &para("a")), cell(0, 1, 1, 1, &para("b"))]],
        );
        let section = decode(&para_with(&format!("{}<hp:t/>", xml)));
        let t = only_table(&section);
        assert_eq!(t.col_count, 2);
        assert!((t.row_count as usize) * 2 <= crate::model::MAX_GRID_POSITIONS);
        assert_eq!(t.rows.len(), t.row_count as usize);
        assert_eq!(t.rows[0].cells.len(), 2);
        assert_eq!(t.cells().count(), 2);
    }

    #[test]
    fn test_crossing_spans_single_owner() {
        let xml = table(
            2,
            2,
            &[
                vec![cell(0, 0, 1, 1, &para("a")), cell(0, 1, 2, 1, &para("tall"))],
                vec![cell(1, 0, 1, 2, &para("wide"))],
            ],
        );
        let section = decode(&para_with(&format!("{}<hp:t/>", xml)));
        let t = only_table(&section);
        assert!(t.is_coverage_consistent());
        assert_eq!(t.cell_at(1, 1).unwrap().text(), "tall");
        assert_eq!(t.cell_at(1, 0).unwrap().col_span, 1);
    }
}
