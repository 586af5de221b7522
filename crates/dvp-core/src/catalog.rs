//! Message catalog: error code to human-readable text
use std::collections::HashMap;

use crate::error::ErrorCode;

/// Read-only lookup injected into the finalizer. Must be safe for
/// concurrent readers.
pub trait MessageCatalog: Send + Sync {
    fn lookup(&self, code: ErrorCode) -> String;
}

/// Built-in texts, used when nothing overrides a code
pub fn default_message(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::FioMismatch => "ФИО в документе не совпадает с ФИО заявителя",
        ErrorCode::FioMissing => "Не удалось найти ФИО в документе",
        ErrorCode::DocTypeUnknown => "Тип документа не распознан или не принимается",
        ErrorCode::DocDateTooOld => "Срок действия документа истёк",
        ErrorCode::DocDateTooRecent => "Документ выдан слишком недавно",
        ErrorCode::DocDateMissing => "Не удалось определить дату документа",
        ErrorCode::DocDateInvalid => "Дата в документе указана некорректно",
        ErrorCode::MultipleDocuments => "Загружено несколько документов в одном файле",
        ErrorCode::FileEmpty => "Загруженный файл пуст",
        ErrorCode::FileTooLarge => "Размер файла превышает допустимый",
        ErrorCode::FileTypeUnsupported => "Формат файла не поддерживается",
        ErrorCode::OcrFailed => "Не удалось распознать текст документа",
        ErrorCode::DocTypeCheckFailed => "Не удалось определить тип документа",
        ErrorCode::ExtractFailed => "Не удалось извлечь данные из документа",
        ErrorCode::LlmResponseInvalid => "Сервис анализа вернул некорректный ответ",
        ErrorCode::Cancelled => "Проверка была отменена",
    }
}

/// Catalog backed by an immutable map, falling back to [`default_message`]
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    messages: HashMap<ErrorCode, String>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(messages: HashMap<ErrorCode, String>) -> Self {
        Self { messages }
    }

    pub fn with_message(mut self, code: ErrorCode, message: impl Into<String>) -> Self {
        self.messages.insert(code, message.into());
        self
    }
}

impl MessageCatalog for StaticCatalog {
    fn lookup(&self, code: ErrorCode) -> String {
        self.messages
            .get(&code)
            .cloned()
            .unwrap_or_else(|| default_message(code).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_code_has_a_default() {
        for code in ErrorCode::ALL {
            assert!(!default_message(code).is_empty(), "{}", code);
        }
    }

    #[test]
    fn test_override_wins() {
        let catalog = StaticCatalog::new().with_message(ErrorCode::FioMismatch, "name mismatch");
        assert_eq!(catalog.lookup(ErrorCode::FioMismatch), "name mismatch");
        assert_eq!(
            catalog.lookup(ErrorCode::OcrFailed),
            default_message(ErrorCode::OcrFailed)
        );
    }
}
