use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::analysis::AnalysisPayload;
use crate::utils::telegram::escape_html;

const EMPTY_PLACEHOLDER: &str = "—";

/// Inline actions attached under the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportAction {
    SaveProfile,
    SetReminder,
    ShowTerms,
}

impl ReportAction {
    pub fn callback_data(self) -> &'static str {
        match self {
            ReportAction::SaveProfile => "save_profile",
            ReportAction::SetReminder => "set_reminder",
            ReportAction::ShowTerms => "show_terms",
        }
    }

    pub fn from_callback_data(data: &str) -> Option<Self> {
        match data {
            "save_profile" => Some(ReportAction::SaveProfile),
            "set_reminder" => Some(ReportAction::SetReminder),
            "show_terms" => Some(ReportAction::ShowTerms),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ReportAction::SaveProfile => "Сохранить профиль",
            ReportAction::SetReminder => "Напомнить уход",
            ReportAction::ShowTerms => "Политика и условия",
        }
    }

    fn button(self) -> InlineKeyboardButton {
        InlineKeyboardButton::callback(self.label(), self.callback_data())
    }
}

pub fn main_actions_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            ReportAction::SaveProfile.button(),
            ReportAction::SetReminder.button(),
        ],
        vec![ReportAction::ShowTerms.button()],
    ])
}

fn format_bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return format!("• {EMPTY_PLACEHOLDER}");
    }
    items
        .iter()
        .map(|item| format!("• {}", escape_html(item)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        return EMPTY_PLACEHOLDER.to_string();
    }
    escape_html(&items.join(", "))
}

fn text_or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        EMPTY_PLACEHOLDER.to_string()
    } else {
        escape_html(value)
    }
}

pub fn build_report(payload: &AnalysisPayload) -> String {
    let profile = &payload.profile;
    let mut report = format!(
        "<b>Твой профиль кожи</b>\n\n\
         <b>Возраст:</b> {age}\n\
         <b>Тип кожи:</b> {skin_type}\n\
         <b>На что обратить внимание:</b> {concerns}\n\n\
         <b>Утренний уход:</b>\n{morning}\n\n\
         <b>Вечерний уход:</b>\n{evening}\n\n\
         <b>Активные ингредиенты:</b> {ingredients}\n\
         <b>Средства:</b> {products}",
        age = text_or_dash(&profile.age_band),
        skin_type = text_or_dash(&profile.skin_type),
        concerns = join_or_dash(&profile.concerns),
        morning = format_bullet_list(&profile.routine.morning),
        evening = format_bullet_list(&profile.routine.evening),
        ingredients = join_or_dash(&profile.ingredients),
        products = join_or_dash(&profile.product_classes),
    );

    if let Some(warning) = profile.warning.as_deref().filter(|w| !w.trim().is_empty()) {
        report.push_str("\n\n⚠️ ");
        report.push_str(&escape_html(warning));
    }
    report
}
