use super::*;

#[test]
fn plain_text_is_sent() {
    assert_eq!(parse_command("  hello there "), Command::Send("hello there".into()));
}

#[test]
fn simple_commands() {
    assert_eq!(parse_command("/new"), Command::New);
    assert_eq!(parse_command("/list"), Command::List);
    assert_eq!(parse_command("/help"), Command::Help);
    assert_eq!(parse_command("/signout"), Command::SignOut);
    assert_eq!(parse_command("/quit"), Command::Quit);
}

#[test]
fn indexed_commands_are_one_based() {
    assert_eq!(parse_command("/select 2"), Command::Select(2));
    assert_eq!(parse_command("/delete 1"), Command::Delete(1));
    assert!(matches!(parse_command("/select 0"), Command::Invalid(_)));
    assert!(matches!(parse_command("/delete x"), Command::Invalid(_)));
    assert!(matches!(parse_command("/select"), Command::Invalid(_)));
}

#[test]
fn text_arguments_are_trimmed() {
    assert_eq!(parse_command("/rename   Trip plans "), Command::Rename("Trip plans".into()));
    assert_eq!(parse_command("/find welcome"), Command::Find("welcome".into()));
    assert_eq!(parse_command("/rename"), Command::Rename(String::new()));
}

#[test]
fn search_toggle() {
    assert_eq!(parse_command("/search on"), Command::Search(true));
    assert_eq!(parse_command("/search off"), Command::Search(false));
    assert!(matches!(parse_command("/search maybe"), Command::Invalid(_)));
}

#[test]
fn unknown_command() {
    assert_eq!(
        parse_command("/frobnicate"),
        Command::Invalid("unknown command /frobnicate; /help lists commands".into())
    );
}
