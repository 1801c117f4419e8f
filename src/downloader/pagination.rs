//! Cursor pagination as a stream of pages
//!
//! Each request depends on the cursor returned by the previous one, so pages are
//! fetched strictly one after another.

use crate::api::{CommentPage, CommentSource, PageRequest};
use crate::error::Result;
use futures::Stream;
use futures::stream;

enum PageState {
    Next(PageRequest),
    Done,
}

/// Stream every page of a video's comments, in order
///
/// The first request starts at content offset zero. The stream ends after the
/// first page without a next cursor, and stops at the first error.
pub fn paginate<'a, S>(source: &'a S, video_id: &'a str) -> impl Stream<Item = Result<CommentPage>> + 'a
where
    S: CommentSource + ?Sized,
{
    stream::try_unfold(PageState::Next(PageRequest::Start), move |state| async move {
        let request = match state {
            PageState::Next(request) => request,
            PageState::Done => return Ok(None),
        };
        let page = source.fetch_page(video_id, &request).await?;
        let next = match &page.next_cursor {
            Some(cursor) => PageState::Next(PageRequest::Cursor(cursor.clone())),
            None => PageState::Done,
        };
        Ok(Some((page, next)))
    })
}
