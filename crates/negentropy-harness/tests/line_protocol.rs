//! Line-protocol runs over in-memory input and output.

use negentropy_harness::{HarnessConfig, HarnessError, Interpreter};

async fn run(input: &str) -> Result<String, HarnessError> {
    let interpreter = Interpreter::new(HarnessConfig::default(), Vec::new())?;
    let out = interpreter.run(input.as_bytes()).await?;
    Ok(String::from_utf8(out).unwrap())
}

fn payload(line: &str) -> &str {
    line.trim_end().strip_prefix("msg,").unwrap()
}

#[tokio::test]
async fn test_two_harness_scenario() {
    // A = {aa@100}, B = {aa@100, bb@200}
    let a1 = run("item,100,aa\nseal\ninitiate\n").await.unwrap();
    let x = payload(&a1);

    let b1 = run(&format!("item,100,aa\nitem,200,bb\nseal\nmsg,{x}\n")).await.unwrap();
    let y = payload(&b1);

    let a2 = run(&format!("item,100,aa\nseal\ninitiate\nmsg,{y}\n")).await.unwrap();
    assert_eq!(a2, format!("msg,{x}\nneed,bb\ndone\n"));
}

#[tokio::test]
async fn test_responder_exits_cleanly_at_end_of_input() {
    let out = run("item,1,aa\nseal\nmsg,6100000200\n").await.unwrap();
    assert_eq!(out, "msg,6100000201aa\n");
}

#[tokio::test]
async fn test_initiator_without_reply_exits_cleanly() {
    let out = run("seal\ninitiate\n").await.unwrap();
    assert_eq!(out, "msg,6100000200\n");
}

#[tokio::test]
async fn test_unknown_command_aborts_without_output() {
    let err = run("item,1,aa\nseal\nbogus\ninitiate\n").await.unwrap_err();
    assert!(matches!(err, HarnessError::UnknownCommand(ref c) if c == "bogus"));
}

#[tokio::test]
async fn test_initiate_after_msg_aborts() {
    let err = run("seal\nmsg,\ninitiate\n").await.unwrap_err();
    assert!(matches!(err, HarnessError::Sync(_)));
}

#[tokio::test]
async fn test_empty_responder_answers_short_ids() {
    let out = run("seal\nmsg,6100000201aa\n").await.unwrap();
    assert_eq!(out, "msg,6100000200\n");
}

#[tokio::test]
async fn test_reserved_timestamp_aborts() {
    let err = run("item,18446744073709551615,bb\nseal\n").await.unwrap_err();
    assert!(matches!(err, HarnessError::InvalidTimestamp(_)));
}

#[tokio::test]
async fn test_malformed_peer_message_aborts() {
    let err = run("seal\nmsg,61ff\n").await.unwrap_err();
    assert!(matches!(err, HarnessError::Sync(_)));
}
