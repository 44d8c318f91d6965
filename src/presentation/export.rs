//! Page layout for the inspection report.
//!
//! Coordinates are millimetres on an A4 portrait page; the renderer that
//! turns this into PDF bytes lives outside the crate.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::InspectionRecord;

use super::format::{file_date, format_timestamp};

pub const REPORT_TITLE: &str = "PUNCH PRESS INSPECTION REPORT";

const TOP: f32 = 20.0;
const LEFT: f32 = 20.0;
const RIGHT: f32 = 190.0;
const CENTER: f32 = 105.0;
const PAGE_BREAK_AT: f32 = 250.0;
const LINE_STEP: f32 = 10.0;
const SECTION_GAP: f32 = 15.0;

const TITLE_SIZE: f32 = 18.0;
const BODY_SIZE: f32 = 14.0;
const TITLE_COLOR: [u8; 3] = [40, 40, 40];
const RULE_COLOR: [u8; 3] = [0, 0, 0];

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PageItem {
    Text {
        x: f32,
        y: f32,
        text: String,
        font_size: f32,
        bold: bool,
        centered: bool,
        color: [u8; 3],
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
    },
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ExportPage {
    pub items: Vec<PageItem>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub file_name: String,
    pub pages: Vec<ExportPage>,
}

impl ExportDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text lines in reading order, for logging or plain-text export.
    pub fn lines(&self) -> Vec<&str> {
        self.pages
            .iter()
            .flat_map(|page| page.items.iter())
            .filter_map(|item| match item {
                PageItem::Text { text, .. } => Some(text.as_str()),
                PageItem::Rule { .. } => None,
            })
            .collect()
    }
}

fn body_line(y: f32, text: String, color: [u8; 3]) -> PageItem {
    PageItem::Text {
        x: LEFT,
        y,
        text,
        font_size: BODY_SIZE,
        bold: true,
        centered: false,
        color,
    }
}

/// Lays out one section per record. Returns `None` when nothing is selected.
pub fn build_report(records: &[&InspectionRecord], today: NaiveDate) -> Option<ExportDocument> {
    if records.is_empty() {
        return None;
    }

    let mut pages = vec![ExportPage::default()];
    let mut y = TOP;
    // Pen color carries over between sections, like a PDF drawing context.
    let mut pen = TITLE_COLOR;

    pages[0].items.push(PageItem::Text {
        x: CENTER,
        y,
        text: REPORT_TITLE.to_string(),
        font_size: TITLE_SIZE,
        bold: true,
        centered: true,
        color: TITLE_COLOR,
    });
    y += SECTION_GAP;

    for (index, record) in records.iter().enumerate() {
        if index > 0 && y > PAGE_BREAK_AT {
            pages.push(ExportPage::default());
            y = TOP;
        }
        let page = match pages.last_mut() {
            Some(page) => page,
            None => break,
        };

        page.items.push(body_line(y, format!("Press: {}", record.press), pen));
        y += LINE_STEP;
        page.items.push(body_line(y, format!("Part: {}", record.part_number), pen));
        y += LINE_STEP;
        page.items.push(body_line(
            y,
            format!("Last Updated: {}", format_timestamp(record.timestamp)),
            pen,
        ));
        y += LINE_STEP;

        pen = record.status.report_color();
        page.items.push(body_line(
            y,
            format!("Status: {}", record.status.as_str().to_uppercase()),
            pen,
        ));
        y += SECTION_GAP;

        if index + 1 < records.len() {
            pen = RULE_COLOR;
            page.items.push(PageItem::Rule { x1: LEFT, x2: RIGHT, y });
            y += SECTION_GAP;
        }
    }

    Some(ExportDocument {
        file_name: format!("Press_Inspections_{}.pdf", file_date(today)),
        pages,
    })
}
