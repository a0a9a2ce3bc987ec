mod comment;
mod contest;
mod filter;
mod identity;
mod photo;
mod vote;

pub use comment::{Comment, Commentable, HasComments};
pub use contest::{Contest, Phase, RegItem};
pub use filter::Filter;
pub use identity::Identity;
pub use photo::{Photo, PhotoSnapshot, ReportKind};
pub use vote::{Score, Vote, VoteKey, bucket_of as vote_bucket};
