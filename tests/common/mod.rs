//! Shared fixtures for integration tests.
#![allow(dead_code)]

use qgen::{QuestionId, QuestionRecord, QuestionType, StubEmbedder};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An isolated directory holding CSV files, a store and an index artifact.
pub struct TestWorkspace {
    pub dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("store")
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.path().join("questions.qvec")
    }
}

pub fn id(raw: u32) -> QuestionId {
    QuestionId::new(raw).expect("non-zero id")
}

pub fn record(raw_id: u32, text: &str) -> QuestionRecord {
    QuestionRecord {
        id: id(raw_id),
        question_type: QuestionType::Underlined,
        question_text: text.to_string(),
        options: vec![],
        vocabulary: String::new(),
        answer: "③".to_string(),
        explanation: String::new(),
    }
}

/// Embedder mapping "A", "B", "C" to [0,0], [1,0], [5,5].
pub fn abc_embedder() -> StubEmbedder {
    StubEmbedder::new(2)
        .with("A", vec![0.0, 0.0])
        .with("B", vec![1.0, 0.0])
        .with("C", vec![5.0, 5.0])
}

pub mod sample_csv {
    pub const HEADER: &str =
        "id,question_type,question_text,options,vocabulary,answer,explanation\n";

    /// Three valid rows whose texts match [`super::abc_embedder`].
    pub const ABC: &str = "id,question_type,question_text,options,vocabulary,answer,explanation\n\
        1,underlined,A,,,①,first\n\
        2,box,B,is|are,,are,second\n\
        3,blank,C,\"work\nworking\",,working,third\n";

    pub const REALISTIC: &str = r#"id,question_type,question_text,options,vocabulary,answer,explanation
10,underlined,"The ability ① to understand emotions ② are essential for building strong relationships.",,"ability: 능력",②,"The subject 'The ability' is singular, so 'is' is required."
11,box,"Plastic waste has (A) [become / becoming] a serious environmental concern.",become|becoming,"concern: 우려",become,"Present perfect takes a past participle."
12,blank,"He has been ______ the project for several months.",work|working|works|worked,,working,"Present perfect progressive."
"#;
}
