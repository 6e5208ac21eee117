//! Coarse technology-stack detection used for agent selection.
//!
//! Detection is best-effort: every field of [`TechStack`] may be empty.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Result of stack detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechStack {
    pub language: Option<String>,
    pub framework: Option<String>,
    pub file_type: Option<String>,
}

impl TechStack {
    pub fn new(language: Option<&str>, framework: Option<&str>) -> Self {
        Self {
            language: language.map(str::to_string),
            framework: framework.map(str::to_string),
            file_type: None,
        }
    }

    pub fn with_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.language.is_none() && self.framework.is_none() && self.file_type.is_none()
    }
}

/// Detects the stack of a file from its path and content.
pub trait TechStackDetector: Send + Sync {
    fn detect(&self, path: &str, content: &str) -> TechStack;
}

/// Extension of a path, without the dot.
pub fn extension_of(path: &str) -> Option<&str> {
    Path::new(path).extension().and_then(|e| e.to_str())
}

/// Extension and marker based detector.
#[derive(Debug, Default, Clone)]
pub struct HeuristicDetector;

impl HeuristicDetector {
    pub fn new() -> Self {
        Self
    }

    fn language(path: &str) -> Option<&'static str> {
        let ext = extension_of(path)?.to_lowercase();
        let language = match ext.as_str() {
            "py" | "pyi" => "python",
            "js" | "jsx" | "mjs" | "cjs" => "javascript",
            "ts" | "tsx" => "typescript",
            "rs" => "rust",
            "java" => "java",
            "go" => "go",
            "rb" => "ruby",
            "cs" => "csharp",
            "vue" => "javascript",
            _ => return None,
        };
        Some(language)
    }

    fn framework(path: &str, content: &str) -> Option<&'static str> {
        let ext = extension_of(path).map(|e| e.to_lowercase());
        let ext = ext.as_deref();

        if ext == Some("jsx")
            || ext == Some("tsx")
            || content.contains("from 'react'")
            || content.contains("from \"react\"")
            || content.contains("require('react')")
        {
            return Some("react");
        }
        if ext == Some("vue")
            || content.contains("from 'vue'")
            || content.contains("from \"vue\"")
        {
            return Some("vue");
        }
        if content.contains("@angular/") {
            return Some("angular");
        }
        if content.contains("from django") || content.contains("import django") {
            return Some("django");
        }
        if content.contains("from flask") || content.contains("import flask") {
            return Some("flask");
        }
        if content.contains("from fastapi") || content.contains("import fastapi") {
            return Some("fastapi");
        }
        if content.contains("require('express')") || content.contains("from 'express'") {
            return Some("express");
        }
        if content.contains("org.springframework") {
            return Some("spring");
        }
        None
    }

    fn file_type(path: &str) -> &'static str {
        let lower = path.to_lowercase();
        let file_name = Path::new(&lower)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("");

        if file_name.starts_with("test_")
            || file_name.contains(".test.")
            || file_name.contains(".spec.")
            || file_name.ends_with("_test.py")
            || lower.contains("/tests/")
            || lower.contains("/__tests__/")
        {
            "test"
        } else if matches!(
            extension_of(file_name),
            Some("json" | "yaml" | "yml" | "toml" | "ini" | "cfg")
        ) {
            "config"
        } else {
            "source"
        }
    }
}

impl TechStackDetector for HeuristicDetector {
    fn detect(&self, path: &str, content: &str) -> TechStack {
        TechStack {
            language: Self::language(path).map(str::to_string),
            framework: Self::framework(path, content).map(str::to_string),
            file_type: Some(Self::file_type(path).to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_react_component() {
        let stack = HeuristicDetector::new().detect(
            "src/components/Button.jsx",
            "import React from 'react';\nexport default function Button() {}",
        );
        assert_eq!(stack.language.as_deref(), Some("javascript"));
        assert_eq!(stack.framework.as_deref(), Some("react"));
        assert_eq!(stack.file_type.as_deref(), Some("source"));
    }

    #[test]
    fn test_detect_python_test_file() {
        let stack = HeuristicDetector::new().detect(
            "app/tests/test_views.py",
            "from django.test import TestCase",
        );
        assert_eq!(stack.language.as_deref(), Some("python"));
        assert_eq!(stack.framework.as_deref(), Some("django"));
        assert_eq!(stack.file_type.as_deref(), Some("test"));
    }

    #[test]
    fn test_detect_unknown_is_mostly_empty() {
        let stack = HeuristicDetector::new().detect("README", "hello");
        assert!(stack.language.is_none());
        assert!(stack.framework.is_none());
        assert_eq!(stack.file_type.as_deref(), Some("source"));
    }

    #[test]
    fn test_config_file_type() {
        let stack = HeuristicDetector::new().detect("package.json", "{}");
        assert_eq!(stack.file_type.as_deref(), Some("config"));
    }
}
