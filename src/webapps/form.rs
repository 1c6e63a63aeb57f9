use super::{AppDraft, AppEntry};
use crate::datekey::{DateKey, DateKeyError};
use crate::theme::Palette;
use crossterm::event::KeyCode;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Flex, Layout, Margin, Rect},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Widget},
};
use std::borrow::Cow;
use thiserror::Error;

const FORM_WIDTH: u16 = 64;

/// One row per [`Field`]
const FIELD_ROWS: u16 = 7;

/// Width of the label column, including the trailing ": "
const LABEL_WIDTH: usize = 14;

const CURSOR: &str = "▏";

/// Shown in place of line breaks in the one-row memo field
const NEWLINE_MARK: &str = " ↵ ";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Field {
    Name,
    Url,
    Description,
    Created,
    Tags,
    Memo,
    Image,
}

impl Field {
    const ALL: [Field; 7] = [
        Field::Name,
        Field::Url,
        Field::Description,
        Field::Created,
        Field::Tags,
        Field::Memo,
        Field::Image,
    ];

    fn label(self) -> &'static str {
        match self {
            Field::Name => "Name*",
            Field::Url => "URL*",
            Field::Description => "Description",
            Field::Created => "Created*",
            Field::Tags => "Tags",
            Field::Memo => "Memo",
            Field::Image => "Image",
        }
    }

    fn next(self) -> Field {
        match self {
            Field::Name => Field::Url,
            Field::Url => Field::Description,
            Field::Description => Field::Created,
            Field::Created => Field::Tags,
            Field::Tags => Field::Memo,
            Field::Memo => Field::Image,
            Field::Image => Field::Name,
        }
    }

    fn prev(self) -> Field {
        match self {
            Field::Name => Field::Image,
            Field::Url => Field::Name,
            Field::Description => Field::Url,
            Field::Created => Field::Description,
            Field::Tags => Field::Created,
            Field::Memo => Field::Tags,
            Field::Image => Field::Memo,
        }
    }
}

/// Text-entry state for adding or editing an app
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct AppForm {
    /// ID of the app being edited, or `None` when adding a new one
    editing: Option<String>,
    name: String,
    url: String,
    description: String,
    created: String,
    tags: String,
    memo: String,
    image: String,
    focus: Field,
    error: Option<FormError>,
}

impl AppForm {
    /// A blank form for a new app, dated `today`
    pub(crate) fn new(today: DateKey) -> AppForm {
        AppForm {
            editing: None,
            name: String::new(),
            url: String::new(),
            description: String::new(),
            created: today.to_string(),
            tags: String::new(),
            memo: String::new(),
            image: String::new(),
            focus: Field::Name,
            error: None,
        }
    }

    /// A form prefilled from an existing app
    pub(crate) fn edit(entry: &AppEntry) -> AppForm {
        AppForm {
            editing: Some(entry.id.clone()),
            name: entry.name.clone(),
            url: entry.url.clone(),
            description: entry.description.clone(),
            created: entry.created_at.to_string(),
            tags: entry.tags.join(", "),
            memo: entry.memo.clone(),
            image: entry.image.clone().unwrap_or_default(),
            focus: Field::Name,
            error: None,
        }
    }

    pub(crate) fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Url => &self.url,
            Field::Description => &self.description,
            Field::Created => &self.created,
            Field::Tags => &self.tags,
            Field::Memo => &self.memo,
            Field::Image => &self.image,
        }
    }

    fn value_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Url => &mut self.url,
            Field::Description => &mut self.description,
            Field::Created => &mut self.created,
            Field::Tags => &mut self.tags,
            Field::Memo => &mut self.memo,
            Field::Image => &mut self.image,
        }
    }

    pub(crate) fn handle_input(&mut self, input: FormInput) -> FormOutput {
        match input {
            FormInput::Char(c) => {
                self.value_mut(self.focus).push(c);
                FormOutput::Ok
            }
            FormInput::Backspace => {
                if self.value_mut(self.focus).pop().is_some() {
                    FormOutput::Ok
                } else {
                    FormOutput::Invalid
                }
            }
            FormInput::Next => {
                self.focus = self.focus.next();
                FormOutput::Ok
            }
            FormInput::Prev => {
                self.focus = self.focus.prev();
                FormOutput::Ok
            }
            // The memo is multi-line, so Enter there starts a new line
            FormInput::Submit if self.focus == Field::Memo => {
                self.memo.push('\n');
                FormOutput::Ok
            }
            FormInput::Submit => match self.validate() {
                Ok(draft) => FormOutput::Submit(draft),
                Err(e) => {
                    self.focus = e.field();
                    self.error = Some(e);
                    FormOutput::Invalid
                }
            },
            FormInput::Cancel => FormOutput::Cancel,
        }
    }

    fn validate(&self) -> Result<AppDraft, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::MissingName);
        }
        let url = self.url.trim();
        if url.is_empty() {
            return Err(FormError::MissingUrl);
        }
        let created_at = self.created.trim().parse::<DateKey>()?;
        let image = self.image.trim();
        Ok(AppDraft {
            name: name.to_owned(),
            url: url.to_owned(),
            description: self.description.clone(),
            created_at,
            tags: parse_tags(&self.tags),
            memo: self.memo.clone(),
            image: (!image.is_empty()).then(|| image.to_owned()),
        })
    }
}

/// Splits comma-separated tag text into trimmed, non-empty tags
pub(crate) fn parse_tags(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub(crate) enum FormError {
    #[error("a name is required")]
    MissingName,
    #[error("a URL is required")]
    MissingUrl,
    #[error("invalid creation date: {0}")]
    BadDate(#[from] DateKeyError),
}

impl FormError {
    fn field(&self) -> Field {
        match self {
            FormError::MissingName => Field::Name,
            FormError::MissingUrl => Field::Url,
            FormError::BadDate(_) => Field::Created,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum FormInput {
    Char(char),
    Backspace,
    Next,
    Prev,
    Submit,
    Cancel,
}

impl FormInput {
    pub(crate) fn from_key(code: KeyCode) -> Option<FormInput> {
        match code {
            KeyCode::Char(c) => Some(FormInput::Char(c)),
            KeyCode::Backspace => Some(FormInput::Backspace),
            KeyCode::Tab | KeyCode::Down => Some(FormInput::Next),
            KeyCode::BackTab | KeyCode::Up => Some(FormInput::Prev),
            KeyCode::Enter => Some(FormInput::Submit),
            KeyCode::Esc => Some(FormInput::Cancel),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum FormOutput {
    Ok,
    Invalid,
    Cancel,
    Submit(AppDraft),
}

/// Popup drawing an [`AppForm`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct AppFormView<'a> {
    form: &'a AppForm,
    palette: Palette,
}

impl<'a> AppFormView<'a> {
    pub(crate) fn new(form: &'a AppForm, palette: Palette) -> Self {
        AppFormView { form, palette }
    }

    fn field_line(&self, field: Field) -> Line<'a> {
        let focused = field == self.form.focus;
        let label = format!("{:>width$}: ", field.label(), width = LABEL_WIDTH - 2);
        let mut spans = vec![
            Span::styled(label, self.palette.muted),
            Span::styled(
                if field == Field::Memo {
                    Cow::Owned(self.form.memo.replace('\n', NEWLINE_MARK))
                } else {
                    Cow::Borrowed(self.form.value(field))
                },
                if focused {
                    self.palette.highlight
                } else {
                    self.palette.base
                },
            ),
        ];
        if focused {
            spans.push(Span::styled(CURSOR, self.palette.highlight));
        }
        Line::from(spans)
    }
}

impl Widget for AppFormView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let height = FIELD_ROWS + 6;
        let [popup] = Layout::horizontal([FORM_WIDTH.min(area.width)])
            .flex(Flex::Center)
            .areas(area);
        let [popup] = Layout::vertical([height.min(area.height)])
            .flex(Flex::Center)
            .areas(popup);
        Clear.render(popup, buf);
        let title = if self.form.editing.is_some() {
            " Edit App "
        } else {
            " Add App "
        };
        let block = Block::bordered()
            .title(title)
            .title_alignment(Alignment::Center)
            .style(self.palette.base);
        let inner = block.inner(popup).inner(Margin::new(1, 1));
        block.render(popup, buf);
        let [fields_area, error_area, hint_area] = Layout::vertical([
            Constraint::Length(FIELD_ROWS),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);
        Paragraph::new(
            Field::ALL
                .into_iter()
                .map(|f| self.field_line(f))
                .collect::<Vec<_>>(),
        )
        .render(fields_area, buf);
        if let Some(e) = &self.form.error {
            Paragraph::new(e.to_string())
                .style(self.palette.error)
                .render(error_area, buf);
        }
        Paragraph::new("TAB: next · ENTER: save (Memo: new line) · ESC: cancel")
            .style(self.palette.muted)
            .alignment(Alignment::Center)
            .render(hint_area, buf);
    }
}
