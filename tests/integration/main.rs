mod replay;
mod scenarios;
mod scroll_follow;
mod transcript;
