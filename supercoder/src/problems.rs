//! Built-in problem statements used when the user does not supply one.

use rand::seq::SliceRandom;

/// Programming problems to fall back on.
pub const SAMPLE_PROBLEMS: &[&str] = &[
    "You are given an m x n integer matrix grid where each cell is either 0 (empty) \
     or 1 (obstacle). You can move up, down, left, or right from and to an empty cell \
     in one step. Return the minimum number of steps to walk from the upper left \
     corner (0, 0) to the lower right corner (m - 1, n - 1) given that you can \
     eliminate at most k obstacles. If it is not possible to find such a walk, \
     return -1.",
    "Create a program that checks if a number is a palindrome. Take a number as \
     input and return True if it is a palindrome, False otherwise. Handle negative \
     numbers and edge cases.",
    "Implement a MedianFinder class that supports addNum(num), which adds an \
     integer from a data stream, and findMedian(), which returns the median of all \
     elements seen so far. For an even number of elements the median is the mean of \
     the two middle values.",
    "Create a program that prints all interleavings of two given strings, assuming \
     all characters in both strings are different.",
];

/// Pick a random built-in problem.
pub fn random_problem() -> &'static str {
    SAMPLE_PROBLEMS
        .choose(&mut rand::thread_rng())
        .expect("sample problem list is non-empty")
}
