use std::sync::Arc;

use uuid::Uuid;

use super::NoticeBoard;
use crate::client::collaborators::FeedingSource;
use crate::client::optimistic::OptimisticList;
use crate::error::Result;
use crate::records::{Draft, FeedingSchedule, NewFeedingSchedule};

/// Feeding schedules of one pet.
pub struct FeedingScreen {
    pet_id: Uuid,
    source: Arc<FeedingSource>,
    list: OptimisticList<FeedingSchedule>,
    notices: NoticeBoard,
}

impl FeedingScreen {
    pub fn new(pet_id: Uuid, source: Arc<FeedingSource>) -> Self {
        Self {
            pet_id,
            source,
            list: OptimisticList::new(),
            notices: NoticeBoard::default(),
        }
    }

    pub fn schedules(&self) -> Vec<FeedingSchedule> {
        self.list.snapshot()
    }

    pub fn notice(&self) -> Option<String> {
        self.notices.last()
    }

    pub async fn load(&self) -> Result<()> {
        let result = async {
            let schedules = self.source.list_by_parent(self.pet_id).await?;
            self.list.replace_all(schedules);
            Ok(())
        }
        .await;
        self.notices.settle("load feeding schedules", result)
    }

    pub async fn add(&self, mut draft: NewFeedingSchedule) -> Result<FeedingSchedule> {
        draft.pet_id = self.pet_id;
        let result = async {
            draft.check()?;
            self.list
                .create(draft.provisional(), self.source.create(draft.clone()))
                .await
        }
        .await;
        self.notices.settle("add the feeding schedule", result)
    }

    pub async fn remove(&self, id: Uuid) -> Result<()> {
        let result = self.list.delete(id, self.source.delete(id)).await;
        self.notices.settle("remove the feeding schedule", result)
    }
}
