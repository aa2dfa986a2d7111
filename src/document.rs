//! Paginated layout of the exported financial report.
//!
//! Positions are millimetres on an A4 page. Content flows top to bottom in a
//! fixed order (summary, budgets, goals) and a new page starts whenever the
//! next block would begin below [`PAGE_BREAK_THRESHOLD`].

use chrono::NaiveDate;
use serde::Serialize;

use crate::metrics::{OverviewMetrics, goal_percentage};
use crate::models::{Budget, SavingsGoal};
use crate::visual_report::format_currency;

pub const REPORT_TITLE: &str = "WalletWise Financial Report";
pub const PAGE_TOP: u32 = 20;
pub const PAGE_BREAK_THRESHOLD: u32 = 250;
pub const LEFT_MARGIN: u32 = 20;

const LINE_STEP: u32 = 10;
const SECTION_GAP: u32 = 10;
const HEADING_GAP: u32 = 15;
const GOAL_BLOCK_STEP: u32 = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextStyle {
    Title,
    Heading,
    Body,
}

impl TextStyle {
    pub fn font_size(&self) -> u32 {
        match self {
            Self::Title => 20,
            Self::Heading => 16,
            Self::Body => 12,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Heading => "heading",
            Self::Body => "body",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub x: u32,
    pub y: u32,
    pub style: TextStyle,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub generated_on: NaiveDate,
    pub pages: Vec<Page>,
}

impl ReportDocument {
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.pages.iter().flat_map(|p| p.lines.iter())
    }
}

/// What the exporter needs: overview figures plus the raw budget and goal rows.
#[derive(Debug, Clone)]
pub struct ReportInput {
    pub generated_for: Option<String>,
    pub generated_on: NaiveDate,
    pub overview: OverviewMetrics,
    pub budgets: Vec<Budget>,
    pub goals: Vec<SavingsGoal>,
}

struct Layout {
    pages: Vec<Page>,
    cursor: u32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            cursor: PAGE_TOP,
        }
    }

    fn break_if_needed(&mut self) {
        if self.cursor > PAGE_BREAK_THRESHOLD {
            self.pages.push(Page::default());
            self.cursor = PAGE_TOP;
        }
    }

    fn put(&mut self, dy: u32, style: TextStyle, text: String) {
        let y = self.cursor + dy;
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(Line {
                x: LEFT_MARGIN,
                y,
                style,
                text,
            });
        }
    }

    fn line(&mut self, style: TextStyle, text: String, advance: u32) {
        self.put(0, style, text);
        self.cursor += advance;
    }

    fn section<T>(
        &mut self,
        heading: &str,
        rows: &[T],
        step: u32,
        mut block: impl FnMut(&T) -> Vec<String>,
    ) {
        if rows.is_empty() {
            return;
        }
        self.cursor += SECTION_GAP;
        self.break_if_needed();
        self.line(TextStyle::Body, heading.to_string(), HEADING_GAP);
        for row in rows {
            self.break_if_needed();
            for (i, text) in block(row).into_iter().enumerate() {
                self.put(i as u32 * LINE_STEP, TextStyle::Body, text);
            }
            self.cursor += step;
        }
    }
}

fn budget_line(budget: &Budget) -> Vec<String> {
    let name = budget
        .category
        .as_ref()
        .map(|c| c.name.as_str())
        .unwrap_or("Category");
    vec![format!("{name}: {}", format_currency(budget.amount, true))]
}

fn goal_block(goal: &SavingsGoal) -> Vec<String> {
    vec![
        format!("{}: {:.1}% complete", goal.title, goal_percentage(goal)),
        format!("  Current: {}", format_currency(goal.current_amount, true)),
        format!("  Target: {}", format_currency(goal.target_amount, true)),
    ]
}

pub fn build_report_document(input: &ReportInput) -> ReportDocument {
    let mut layout = Layout::new();
    let overview = &input.overview;
    let user = input.generated_for.as_deref().unwrap_or("User");

    layout.line(TextStyle::Title, REPORT_TITLE.to_string(), 15);
    layout.line(TextStyle::Body, format!("Generated for: {user}"), LINE_STEP);
    layout.line(
        TextStyle::Body,
        format!("Date: {}", input.generated_on.format("%Y-%m-%d")),
        20,
    );
    layout.line(TextStyle::Heading, "Financial Summary".to_string(), HEADING_GAP);

    let summary = [
        format!("Total Balance: {}", format_currency(overview.total_balance, true)),
        format!("Monthly Income: {}", format_currency(overview.monthly_income, true)),
        format!(
            "Monthly Expenses: {}",
            format_currency(overview.monthly_expenses, true)
        ),
        format!(
            "Net Savings: {}",
            format_currency(overview.net_monthly_savings(), true)
        ),
        format!("Savings Rate: {:.1}%", overview.display_savings_rate()),
    ];
    for text in summary {
        layout.line(TextStyle::Body, text, LINE_STEP);
    }

    layout.section("Active Budgets", &input.budgets, LINE_STEP, budget_line);
    layout.section("Savings Goals", &input.goals, GOAL_BLOCK_STEP, goal_block);

    ReportDocument {
        title: REPORT_TITLE.to_string(),
        generated_on: input.generated_on,
        pages: layout.pages,
    }
}

pub fn report_file_name(date: NaiveDate) -> String {
    format!("walletwise-report-{}.html", date.format("%Y-%m-%d"))
}
