//! In-process [`QuizStore`] over `tokio::sync::RwLock`-guarded hash maps.
//!
//! Used by the CLI (one ingest-generate-grade session per invocation) and
//! by tests. Lock scope is one table per operation, matching the
//! no-cross-stage-transaction contract of the trait.

use super::QuizStore;
use crate::error::QuizError;
use crate::model::{
    DocumentDraft, NoteDraft, Question, Quiz, QuizDraft, QuizResult, QuizResultDraft, RawPage,
    SourceDocument, WrongAnswerNote,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory store; cheap to create, everything dropped with it.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<Uuid, SourceDocument>>,
    chunks: RwLock<HashMap<Uuid, Vec<RawPage>>>,
    quizzes: RwLock<HashMap<Uuid, Quiz>>,
    results: RwLock<HashMap<Uuid, QuizResult>>,
    notes: RwLock<HashMap<Uuid, WrongAnswerNote>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn create_document(&self, draft: DocumentDraft) -> Result<SourceDocument, QuizError> {
        let document = SourceDocument {
            id: Uuid::new_v4(),
            name: draft.name,
            source_ref: draft.source_ref,
            owner: draft.owner,
            processed: false,
            created_at: Utc::now(),
        };
        self.documents
            .write()
            .await
            .insert(document.id, document.clone());
        Ok(document)
    }

    async fn find_document(&self, id: Uuid) -> Result<Option<SourceDocument>, QuizError> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn find_documents(
        &self,
        owner: Option<&str>,
    ) -> Result<Vec<SourceDocument>, QuizError> {
        let mut documents: Vec<SourceDocument> = self
            .documents
            .read()
            .await
            .values()
            .filter(|d| owner.is_none() || d.owner.as_deref() == owner)
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(documents)
    }

    async fn mark_document_processed(&self, id: Uuid) -> Result<(), QuizError> {
        match self.documents.write().await.get_mut(&id) {
            Some(document) => {
                document.processed = true;
                Ok(())
            }
            None => Err(QuizError::DocumentNotFound { id }),
        }
    }

    async fn create_chunks(
        &self,
        document_id: Uuid,
        pages: Vec<RawPage>,
    ) -> Result<(), QuizError> {
        let mut chunks = self.chunks.write().await;
        let entry = chunks.entry(document_id).or_default();
        entry.extend(pages);
        entry.sort_by_key(|p| p.page);
        Ok(())
    }

    async fn find_chunks(&self, document_id: Uuid) -> Result<Vec<RawPage>, QuizError> {
        Ok(self
            .chunks
            .read()
            .await
            .get(&document_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_quiz(&self, draft: QuizDraft) -> Result<Quiz, QuizError> {
        let questions = draft
            .questions
            .into_iter()
            .map(|c| Question {
                id: Uuid::new_v4(),
                kind: c.kind,
                text: c.text,
                options: c.options,
                answer: c.answer,
                explanation: c.explanation,
                source_context: c.source_context,
            })
            .collect();
        let quiz = Quiz {
            id: Uuid::new_v4(),
            title: draft.title,
            created_at: Utc::now(),
            is_regenerated: draft.is_regenerated,
            source_note_id: draft.source_note_id,
            weakness_analysis: draft.weakness_analysis,
            source_document_id: draft.source_document_id,
            questions,
        };
        self.quizzes.write().await.insert(quiz.id, quiz.clone());
        Ok(quiz)
    }

    async fn find_quiz(&self, id: Uuid) -> Result<Option<Quiz>, QuizError> {
        Ok(self.quizzes.read().await.get(&id).cloned())
    }

    async fn find_quiz_for_document(
        &self,
        document_id: Uuid,
    ) -> Result<Option<Quiz>, QuizError> {
        Ok(self
            .quizzes
            .read()
            .await
            .values()
            .filter(|q| !q.is_regenerated && q.source_document_id == Some(document_id))
            .min_by_key(|q| q.created_at)
            .cloned())
    }

    async fn find_quiz_for_note(&self, note_id: Uuid) -> Result<Option<Quiz>, QuizError> {
        Ok(self
            .quizzes
            .read()
            .await
            .values()
            .filter(|q| q.is_regenerated && q.source_note_id == Some(note_id))
            .min_by_key(|q| q.created_at)
            .cloned())
    }

    async fn find_quizzes(&self) -> Result<Vec<Quiz>, QuizError> {
        let mut quizzes: Vec<Quiz> = self.quizzes.read().await.values().cloned().collect();
        quizzes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(quizzes)
    }

    async fn create_result(&self, draft: QuizResultDraft) -> Result<QuizResult, QuizError> {
        let result = QuizResult {
            id: Uuid::new_v4(),
            quiz_id: draft.quiz_id,
            score: draft.score,
            total_questions: draft.total_questions,
            correct_questions: draft.correct_questions,
            created_at: Utc::now(),
            answers: draft.answers,
        };
        self.results.write().await.insert(result.id, result.clone());
        Ok(result)
    }

    async fn find_result(&self, id: Uuid) -> Result<Option<QuizResult>, QuizError> {
        Ok(self.results.read().await.get(&id).cloned())
    }

    async fn create_note(&self, draft: NoteDraft) -> Result<WrongAnswerNote, QuizError> {
        let note = WrongAnswerNote {
            id: Uuid::new_v4(),
            title: draft.title,
            quiz_result_id: draft.quiz_result_id,
            created_at: Utc::now(),
            items: draft.items,
        };
        self.notes.write().await.insert(note.id, note.clone());
        Ok(note)
    }

    async fn find_note(&self, id: Uuid) -> Result<Option<WrongAnswerNote>, QuizError> {
        Ok(self.notes.read().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CandidateQuestion, QuestionKind};
    use tokio_test::block_on;

    fn candidate(page: u32, text: &str, answer: &str) -> CandidateQuestion {
        CandidateQuestion {
            page,
            kind: QuestionKind::ShortAnswer,
            text: text.to_string(),
            options: None,
            answer: answer.to_string(),
            explanation: String::new(),
            source_context: String::new(),
        }
    }

    fn draft_quiz(document_id: Option<Uuid>, regenerated: bool) -> QuizDraft {
        QuizDraft {
            title: "Test quiz".into(),
            is_regenerated: regenerated,
            source_note_id: None,
            weakness_analysis: None,
            source_document_id: document_id,
            questions: vec![candidate(3, "Capital of France?", "Paris")],
        }
    }

    #[test]
    fn document_roundtrip_and_processed_flag() {
        block_on(async {
            let store = MemoryStore::new();
            let doc = store
                .create_document(DocumentDraft {
                    name: "lecture.pdf".into(),
                    source_ref: Some("s3://bucket/lecture.pdf".into()),
                    owner: Some("alice".into()),
                })
                .await
                .unwrap();
            assert!(!doc.processed);

            store.mark_document_processed(doc.id).await.unwrap();
            let found = store.find_document(doc.id).await.unwrap().unwrap();
            assert!(found.processed);
        });
    }

    #[test]
    fn missing_document_cannot_be_marked() {
        block_on(async {
            let store = MemoryStore::new();
            let err = store
                .mark_document_processed(Uuid::new_v4())
                .await
                .unwrap_err();
            assert!(matches!(err, QuizError::DocumentNotFound { .. }));
        });
    }

    #[test]
    fn document_listing_filters_by_owner() {
        block_on(async {
            let store = MemoryStore::new();
            for owner in ["alice", "alice", "bob"] {
                store
                    .create_document(DocumentDraft {
                        name: format!("{owner}.pdf"),
                        owner: Some(owner.into()),
                        ..Default::default()
                    })
                    .await
                    .unwrap();
            }
            assert_eq!(store.find_documents(Some("alice")).await.unwrap().len(), 2);
            assert_eq!(store.find_documents(None).await.unwrap().len(), 3);
        });
    }

    #[test]
    fn chunks_come_back_page_ordered() {
        block_on(async {
            let store = MemoryStore::new();
            let doc_id = Uuid::new_v4();
            store
                .create_chunks(
                    doc_id,
                    vec![
                        RawPage { page: 2, content: "second".into() },
                        RawPage { page: 1, content: "first".into() },
                    ],
                )
                .await
                .unwrap();
            let pages = store.find_chunks(doc_id).await.unwrap();
            assert_eq!(pages[0].page, 1);
            assert_eq!(pages[1].page, 2);
        });
    }

    #[test]
    fn quiz_promotion_assigns_ids_and_sheds_page() {
        block_on(async {
            let store = MemoryStore::new();
            let quiz = store.create_quiz(draft_quiz(None, false)).await.unwrap();
            assert_eq!(quiz.questions.len(), 1);
            assert_eq!(quiz.questions[0].answer, "Paris");
            // Promoted questions carry an id; the draft's page is gone.
            assert_ne!(quiz.questions[0].id, Uuid::nil());
        });
    }

    #[test]
    fn document_binding_ignores_regenerated_quizzes() {
        block_on(async {
            let store = MemoryStore::new();
            let doc_id = Uuid::new_v4();
            store
                .create_quiz(draft_quiz(Some(doc_id), true))
                .await
                .unwrap();
            assert!(store
                .find_quiz_for_document(doc_id)
                .await
                .unwrap()
                .is_none());

            let primary = store
                .create_quiz(draft_quiz(Some(doc_id), false))
                .await
                .unwrap();
            let found = store.find_quiz_for_document(doc_id).await.unwrap().unwrap();
            assert_eq!(found.id, primary.id);
        });
    }

    #[test]
    fn note_binding_requires_regenerated_flag() {
        block_on(async {
            let store = MemoryStore::new();
            let note_id = Uuid::new_v4();
            let mut draft = draft_quiz(None, true);
            draft.source_note_id = Some(note_id);
            let remediation = store.create_quiz(draft).await.unwrap();

            let found = store.find_quiz_for_note(note_id).await.unwrap().unwrap();
            assert_eq!(found.id, remediation.id);
            assert!(store
                .find_quiz_for_note(Uuid::new_v4())
                .await
                .unwrap()
                .is_none());
        });
    }
}
