// Copyright 2025 Tracelight Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tracelight SDK Basic Example
//!
//! Walks through the full client surface against a local collector:
//! identify, direct event tracking, signals, an incremental interaction,
//! and a session with aggregated usage. Run with:
//!
//! ```sh
//! TRACELIGHT_WRITE_KEY=wk_dev cargo run --example basic
//! ```

use tracelight::{
    Attachment, AttachmentRole, ClientConfig, EventRecord, Properties, Sentiment, SessionOutcome,
    SignalRecord, TrackingClient,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing so the flush-path logs are visible
    tracing_subscriber::fmt::init();

    let config = ClientConfig::from_env()?.with_debug_logs(true);
    let client = TrackingClient::new(config)?;

    println!("Tracelight Rust SDK Example\n");

    // 1. Identify the user
    println!("1. Identifying user...");
    let mut traits = Properties::new();
    traits.insert("name".into(), "Test User".into());
    traits.insert("email".into(), "test@example.com".into());
    traits.insert("plan".into(), "trial".into());
    client.identify("test_user_001", traits)?;

    // 2. Track a complete AI interaction
    println!("2. Tracking AI interaction...");
    let event_id = client.track_event(
        EventRecord::new("test_user_001", "user_message")
            .with_model("gemini-2.5-pro")
            .with_input("What is the capital of France?")
            .with_output("The capital of France is Paris.")
            .with_conversation_id("convo_001")
            .with_property("experiment", "sdk_demo"),
    )?;
    println!("   Tracked: {}\n", event_id);

    // 3. Attach feedback signals to the event
    println!("3. Tracking signals...");
    client.track_signal(SignalRecord::reaction(&event_id, "thumbs_up", Sentiment::Positive))?;
    client.track_signal(SignalRecord::feedback(
        &event_id,
        "user_feedback",
        "This was very helpful, thanks!",
    ))?;

    // 4. Incremental interaction: begin, enrich, finish
    println!("4. Running incremental interaction...");
    let mut interaction = client.begin_interaction(
        "test_user_001",
        "code_generation",
        "Write a Python function to calculate fibonacci",
    )?;
    println!("   Started: {}", interaction.id());

    interaction.add_attachments(vec![Attachment::text(
        "Additional context",
        "It should be recursive and handle edge cases",
        AttachmentRole::Input,
    )])?;

    let code = "def fibonacci(n):\n    return n if n <= 1 else fibonacci(n-1) + fibonacci(n-2)\n";
    let interaction_event = interaction.finish(
        code,
        vec![Attachment::code("fibonacci.py", code, AttachmentRole::Output, "python")],
    )?;
    println!("   Finished as event: {}\n", interaction_event);

    // 5. Session with aggregated usage
    println!("5. Running session...");
    let session_id = client.create_session("SDK demo run", "demo_agent")?;
    let session = client.session(&session_id).ok_or("session not found")?;
    for _ in 0..3 {
        // Token counts would come from the LLM provider's usage metadata.
        session.record_llm_call_for_model("gemini-2.5-pro", 100, 50)?;
    }

    let usage = client.usage_summary(&session_id)?;
    println!("   LLM calls:         {}", usage.llm_calls);
    println!("   Prompt tokens:     {}", usage.total_prompt_tokens);
    println!("   Completion tokens: {}", usage.total_completion_tokens);
    println!("   Total tokens:      {}", usage.total_tokens);
    println!("   Estimated cost:    ${:.4}", usage.total_cost);
    println!("   Duration:          {}ms\n", usage.duration_ms);

    client.complete_session(
        &session_id,
        SessionOutcome::success()
            .with_metric("first_contact_resolution", 1i64)
            .with_metric("customer_satisfaction_score", 4.5),
    )?;

    // 6. Shut down: final flush, then report what made it
    println!("6. Shutting down...");
    let queued = client.pending_records();
    let report = client.shutdown().await?;
    println!("   Queued:    {}", queued);
    println!("   Delivered: {}", report.delivered);
    println!("   Failed:    {}", report.failed.len());
    for key in &report.failed {
        println!("     - {}", key);
    }

    Ok(())
}
