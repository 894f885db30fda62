/// Chat transcripts with a scripted model
use std::sync::Mutex;

use async_trait::async_trait;
use lifenode::*;

/// Replies from a script and remembers every request it saw
struct ScriptedModel {
    replies: Mutex<Vec<ChatReply>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedModel {
    fn new(replies: Vec<ChatReply>) -> Self {
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn generate(&self, request: GenerateRequest) -> Result<ChatReply, ChatError> {
        self.requests.lock().unwrap().push(request);
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(ChatError::Model("no scripted reply left".to_string()));
        }
        Ok(replies.remove(0))
    }
}

fn app() -> LifeNode {
    LifeNode::in_memory(Clock::System).unwrap()
}

#[tokio::test]
async fn test_only_three_transcripts_are_kept() {
    let app = app();
    let transcripts = app.transcripts();
    let history = vec![ChatMessage::user("hello")];

    for problem in ["two-sum", "three-sum", "four-sum"] {
        transcripts.save_history(problem, &history).await.unwrap();
    }
    // Re-saving makes two-sum the newest
    transcripts.save_history("two-sum", &history).await.unwrap();
    transcripts.save_history("lru-cache", &history).await.unwrap();

    let problems = transcripts.list_problems().await.unwrap();
    assert_eq!(problems.len(), MAX_TRANSCRIPTS);
    assert_eq!(problems, vec!["four-sum", "two-sum", "lru-cache"]);

    let evicted = transcripts.fetch_history("three-sum", 10, 0).await.unwrap();
    assert_eq!(evicted.total_message_count, 0);
}

#[tokio::test]
async fn test_ask_records_exchange_and_sends_history() {
    let app = app();
    let transcripts = app.transcripts();

    let mut first = ChatReply::text("Sort first, then use two pointers.");
    first.hints = vec!["What does sorting buy you?".to_string()];
    let mut second = ChatReply::text("Your loop skips the last index.");
    second.snippet = Some("for i in 0..=n {}".to_string());
    second.programming_language = Some("rust".to_string());
    let model = ScriptedModel::new(vec![first.clone(), second.clone()]);

    let reply = transcripts
        .ask(&model, "three-sum", "How do I start?", "You are a tutor.", None)
        .await
        .unwrap();
    assert_eq!(reply, first);

    let reply = transcripts
        .ask(
            &model,
            "three-sum",
            "Why does this fail?",
            "You are a tutor.",
            Some("fn main() {}".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(reply, second);

    let requests = model.requests.lock().unwrap();
    assert!(requests[0].history.is_empty());
    assert_eq!(requests[1].history.len(), 2);
    assert_eq!(requests[1].history[0].content, "How do I start?");
    assert_eq!(requests[1].history[1].role, ChatRole::Assistant);
    assert!(requests[1].history[1].content.contains("two pointers"));
    assert_eq!(requests[1].extracted_code.as_deref(), Some("fn main() {}"));

    let page = transcripts.fetch_history("three-sum", 2, 0).await.unwrap();
    assert_eq!(page.total_message_count, 4);
    assert_eq!(page.messages[0], ChatMessage::user("Why does this fail?"));
    assert_eq!(page.messages[1], ChatMessage::assistant(second));
}

#[tokio::test]
async fn test_invalid_reply_is_not_stored() {
    let app = app();
    let transcripts = app.transcripts();

    let mut too_many_hints = ChatReply::text("Think about it.");
    too_many_hints.hints = vec!["one".into(), "two".into(), "three".into()];
    let model = ScriptedModel::new(vec![too_many_hints]);

    let result = transcripts
        .ask(&model, "two-sum", "Help?", "You are a tutor.", None)
        .await;

    assert!(matches!(result, Err(ChatError::InvalidOutput(_))));
    assert!(transcripts.list_problems().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_model_failure_leaves_transcript_untouched() {
    let app = app();
    let transcripts = app.transcripts();
    let history = vec![ChatMessage::user("earlier question")];
    transcripts.save_history("two-sum", &history).await.unwrap();

    let model = ScriptedModel::new(Vec::new());
    let result = transcripts
        .ask(&model, "two-sum", "Another?", "You are a tutor.", None)
        .await;

    assert!(matches!(result, Err(ChatError::Model(_))));
    let page = transcripts.fetch_history("two-sum", 10, 0).await.unwrap();
    assert_eq!(page.messages, history);
}

#[tokio::test]
async fn test_clear_history() {
    let app = app();
    let transcripts = app.transcripts();
    transcripts
        .save_history("two-sum", &[ChatMessage::user("hi")])
        .await
        .unwrap();

    assert!(transcripts.clear_history("two-sum").await.unwrap());
    assert!(!transcripts.clear_history("two-sum").await.unwrap());
    assert!(transcripts.list_problems().await.unwrap().is_empty());
}
