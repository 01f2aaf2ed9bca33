//! Selectors, labels and URLs of the record portal, versioned as one unit.

use action_primitives::{FieldSpec, HourOption};
use std::time::Duration;

use crate::types::{Hours, Subject};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiContract {
    pub version: &'static str,
    pub login_url: String,
    pub identifier_field: FieldSpec,
    pub to_secret_button: FieldSpec,
    pub secret_field: FieldSpec,
    /// Gesture clicked after the secret is entered
    pub reveal_gesture: FieldSpec,
    pub login_button: FieldSpec,
    pub record_link: FieldSpec,
    pub edit_link: FieldSpec,
    /// Element wrapping one subject row of the record form
    pub subject_container: String,
    /// Hour scale printed in every subject row
    pub hour_caption: String,
    pub hour_control_role: String,
    pub comment_field: FieldSpec,
    pub confirm_button: FieldSpec,
    /// Index of the option for zero hours
    pub option_offset: u8,
    pub settle_delay: Duration,
}

impl UiContract {
    pub fn v1() -> Self {
        Self {
            version: "v1",
            login_url: "https://id.classi.jp/login/identifier".to_string(),
            identifier_field: FieldSpec::role("textbox", "入力してください"),
            to_secret_button: FieldSpec::role("button", "パスワード入力へ"),
            secret_field: FieldSpec::role("textbox", "入力してください"),
            reveal_gesture: FieldSpec::css("i"),
            login_button: FieldSpec::role("button", "ログインする"),
            record_link: FieldSpec::role("link", "学習記録"),
            edit_link: FieldSpec::role("link", "入力・編集"),
            subject_container: "study-subject-learning-report".to_string(),
            hour_caption: "00 01 02 03 04 05 06 07".to_string(),
            hour_control_role: "combobox".to_string(),
            comment_field: FieldSpec::role("textbox", "今日はどんな一日でしたか？"),
            confirm_button: FieldSpec::role("button", "内容を確定する"),
            option_offset: HourOption::DEFAULT_OFFSET,
            settle_delay: Duration::from_secs(1),
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Hour dropdown inside the row labelled with `subject`.
    pub fn subject_field(&self, subject: Subject) -> FieldSpec {
        FieldSpec::scoped(
            self.subject_container.clone(),
            [subject.label().to_string(), self.hour_caption.clone()],
            self.hour_control_role.clone(),
        )
    }

    pub fn hour_option(&self, hours: Hours) -> HourOption {
        HourOption::with_offset(hours.get(), self.option_offset)
    }
}

impl Default for UiContract {
    fn default() -> Self {
        Self::v1()
    }
}
