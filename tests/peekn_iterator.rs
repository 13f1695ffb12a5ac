use cfront::utils::{PeekN, PeekNIterator};

#[test]
fn peek_does_not_consume() {
    let iterable = [1,2,3,4];
    let mut peek = iterable.iter().peekable_n();

    assert_eq!(peek.peek(), Some(&&1));
    assert_eq!(peek.peek(), Some(&&1));
    assert_eq!(peek.next(), Some(&1));
    assert_eq!(peek.peek(), Some(&&2));
}

#[test]
fn peek_nth_with_valid_amount() {
    let iterable = [1,2,3,4];
    let mut iter = iterable.iter().peekable_n();

    assert_eq!(iter.peek_nth(0), Some(&&1));
    assert_eq!(iter.peek_nth(1), Some(&&2));
    assert_eq!(iter.peek_nth(2), Some(&&3));
    assert_eq!(iter.peek_nth(3), Some(&&4));
    assert_eq!(iter.peek_nth(4), None);
    assert_eq!(iter.next(), Some(&1));
}

#[test]
fn peek_nth_empty() {
    let iterable: [i32; 0] = [];
    let mut iter = iterable.iter().peekable_n();

    assert_eq!(iter.peek_nth(0), None);
    assert_eq!(iter.peek_nth(1), None);
    assert_eq!(iter.next(), None);
}

#[test]
fn peek_past_end_then_drain() {
    let mut iter: PeekNIterator<_> = "ab".chars().peekable_n();

    assert_eq!(iter.peek_nth(5), None);
    assert_eq!(iter.next(), Some('a'));
    assert_eq!(iter.next(), Some('b'));
    assert_eq!(iter.next(), None);
    assert_eq!(iter.peek(), None);
}

#[test]
fn starts_with_punctuators() {
    let mut iter = ">>= 1".chars().peekable_n();

    assert!(iter.starts_with(">>=".chars()));
    assert!(iter.starts_with(">>".chars()));
    assert!(!iter.starts_with("->".chars()));
    assert!(!iter.starts_with(">>= 1 and more".chars()));
    assert_eq!(iter.next(), Some('>'));
    assert!(iter.starts_with(">=".chars()));
}
