use crate::domain::posts::ImageUpdate;

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub title: String,
    pub content: String,
    pub image_ref: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostCommand {
    pub title: String,
    pub content: String,
    pub image: ImageUpdate,
}
